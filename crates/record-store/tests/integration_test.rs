use record_store::{Record, StoreActor, StoreError};

// --- Test Record ---

#[derive(Clone, Debug, PartialEq)]
struct Ticket {
    id: u32,
    station: String,
    done: bool,
}

#[derive(Debug)]
struct NewTicket {
    station: String,
}

#[derive(Debug)]
enum TicketFilter {
    Id(u32),
    Station(String),
    Open,
}

#[derive(Debug)]
enum TicketPatch {
    Finish,
    Move(String),
}

#[derive(Debug, thiserror::Error)]
enum TicketError {
    #[error("station must not be empty")]
    EmptyStation,
    #[error("ticket {0} already finished")]
    AlreadyDone(u32),
}

impl Record for Ticket {
    type Id = u32;
    type New = NewTicket;
    type Filter = TicketFilter;
    type Patch = TicketPatch;
    type Error = TicketError;

    fn from_insert(id: u32, new: NewTicket) -> Result<Self, TicketError> {
        if new.station.is_empty() {
            return Err(TicketError::EmptyStation);
        }
        Ok(Self {
            id,
            station: new.station,
            done: false,
        })
    }

    fn matches(&self, filter: &TicketFilter) -> bool {
        match filter {
            TicketFilter::Id(id) => self.id == *id,
            TicketFilter::Station(station) => &self.station == station,
            TicketFilter::Open => !self.done,
        }
    }

    fn apply_patch(&mut self, patch: &TicketPatch) -> Result<(), TicketError> {
        match patch {
            TicketPatch::Finish if self.done => Err(TicketError::AlreadyDone(self.id)),
            TicketPatch::Finish => {
                self.done = true;
                Ok(())
            }
            TicketPatch::Move(station) => {
                self.station = station.clone();
                Ok(())
            }
        }
    }
}

fn new_ticket(station: &str) -> NewTicket {
    NewTicket {
        station: station.to_string(),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_store_full_lifecycle() {
    let (actor, client) = StoreActor::<Ticket>::new(10);
    tokio::spawn(actor.run());

    // 1. Insert
    let rows = client
        .insert(vec![new_ticket("grill"), new_ticket("fryer")])
        .await
        .unwrap();
    assert_eq!(rows.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);

    // 2. Get: absence is not an error
    assert_eq!(client.get(1).await.unwrap().unwrap().station, "grill");
    assert!(client.get(99).await.unwrap().is_none());

    // 3. Update
    let updated = client
        .update(TicketFilter::Id(2), TicketPatch::Move("grill".into()))
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    let grill = client
        .select(TicketFilter::Station("grill".into()))
        .await
        .unwrap();
    assert_eq!(grill.len(), 2);

    // 4. Update matching nothing answers an empty set
    let none = client
        .update(TicketFilter::Id(42), TicketPatch::Finish)
        .await
        .unwrap();
    assert!(none.is_empty());

    // 5. Delete
    let removed = client.delete(TicketFilter::Id(1)).await.unwrap();
    assert_eq!(removed, 1);
    assert!(client.get(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_insert_stores_nothing() {
    let (actor, client) = StoreActor::<Ticket>::new(10);
    tokio::spawn(actor.run());

    let result = client
        .insert(vec![new_ticket("grill"), new_ticket("")])
        .await;
    assert!(matches!(result, Err(StoreError::Rejected(_))));
    assert!(client.select(TicketFilter::Open).await.unwrap().is_empty());

    // Ids are not burned by the rejected batch
    let row = client.insert_one(new_ticket("pass")).await.unwrap();
    assert_eq!(row.id, 1);
}

#[tokio::test]
async fn test_rejected_patch_is_all_or_nothing() {
    let (actor, client) = StoreActor::<Ticket>::new(10);
    tokio::spawn(actor.run());

    client
        .insert(vec![new_ticket("grill"), new_ticket("grill")])
        .await
        .unwrap();
    client
        .update(TicketFilter::Id(2), TicketPatch::Finish)
        .await
        .unwrap();

    // Ticket 2 refuses a second Finish, so ticket 1 must stay open too
    let result = client
        .update(TicketFilter::Station("grill".into()), TicketPatch::Finish)
        .await;
    assert!(matches!(result, Err(StoreError::Rejected(_))));
    assert!(!client.get(1).await.unwrap().unwrap().done);
}

#[tokio::test]
async fn test_concurrent_get_or_insert_creates_once() {
    let (actor, client) = StoreActor::<Ticket>::new(32);
    tokio::spawn(actor.run());

    let mut handles = vec![];
    for _ in 0..10 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .get_or_insert(TicketFilter::Station("expo".into()), new_ticket("expo"))
                .await
        }));
    }

    let mut created = 0;
    let mut ids = vec![];
    for handle in handles {
        let (row, was_created) = handle.await.unwrap().unwrap();
        if was_created {
            created += 1;
        }
        ids.push(row.id);
    }

    assert_eq!(created, 1, "exactly one caller should create the row");
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(
        client
            .select(TicketFilter::Station("expo".into()))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_closed_store_reports_closed() {
    let (actor, client) = StoreActor::<Ticket>::new(10);
    drop(actor);

    let result = client.get(1).await;
    assert!(matches!(result, Err(StoreError::Closed)));
}
