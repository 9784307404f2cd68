use retro_session::db::Database;
use retro_session::models::*;
use retro_session::storage::SnapshotStorage;
use retro_session::store::{SessionStore, DEFAULT_STORAGE_KEY};
use speculate2::speculate;

fn populate(store: &mut SessionStore<Database>) {
    store.set_step(RetroStep::Checkout);
    store.set_icebreaker_response("A long weekend").unwrap();
    store
        .add_card(CreateCardInput {
            content: "Great teamwork".to_string(),
            category: CardCategory::Good,
        })
        .unwrap();
    store
        .add_card(CreateCardInput {
            content: "Missed deadline".to_string(),
            category: CardCategory::Bad,
        })
        .unwrap();
    store.assign_topic_to_all("Sprint Review").unwrap();
    store.vote_for_topic("Sprint Review").unwrap();
    store.vote_for_topic("Tooling").unwrap();
    store
        .add_action_item(CreateActionItemInput {
            content: "Add buffer to estimates".to_string(),
            topic: "Sprint Review".to_string(),
        })
        .unwrap();
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "snapshot storage" {
        it "returns None for a missing key" {
            assert!(db.get("missing").expect("Query failed").is_none());
        }

        it "replaces the record on repeated writes" {
            db.set("retro", b"first").expect("Write failed");
            db.set("retro", b"second").expect("Write failed");

            assert_eq!(db.get("retro").expect("Query failed"), Some(b"second".to_vec()));
            assert_eq!(db.list_snapshots().expect("Query failed").len(), 1);
        }

        it "clears a record and tolerates clearing twice" {
            db.set("retro", b"data").expect("Write failed");

            assert!(db.delete_snapshot("retro").expect("Delete failed"));
            assert!(!db.delete_snapshot("retro").expect("Delete failed"));
            db.clear("retro").expect("Clear failed");
            assert!(db.get("retro").expect("Query failed").is_none());
        }

        it "lists records with their sizes" {
            db.set("a", b"12345").expect("Write failed");
            db.set("b", b"1").expect("Write failed");

            let mut records = db.list_snapshots().expect("Query failed");
            records.sort_by(|x, y| x.key.cmp(&y.key));

            assert_eq!(records.len(), 2);
            assert_eq!(records[0].key, "a");
            assert_eq!(records[0].size, 5);
            assert_eq!(records[1].size, 1);
        }
    }

    describe "session store on sqlite" {
        it "round-trips the persisted fields" {
            let mut store = SessionStore::open(db.clone());
            populate(&mut store);

            let reopened = SessionStore::open(db.clone());

            assert_eq!(reopened.current_step(), RetroStep::Checkout);
            assert_eq!(reopened.icebreaker_response(), "A long weekend");
            assert_eq!(reopened.cards(), store.cards());
            assert_eq!(reopened.votes(), store.votes());
            assert_eq!(reopened.available_votes(), 1);
            assert_eq!(reopened.action_items(), store.action_items());
            assert_eq!(reopened.prior_action_items(), prior_action_items().as_slice());
        }

        it "starts fresh after a reset" {
            let mut store = SessionStore::open(db.clone());
            populate(&mut store);
            store.reset_session();

            assert!(db.get(DEFAULT_STORAGE_KEY).expect("Query failed").is_none());
            assert_eq!(SessionStore::open(db.clone()).session(), &Session::default());
        }

        it "ignores a corrupt record" {
            db.set(DEFAULT_STORAGE_KEY, b"\xff\xfe not a snapshot").expect("Write failed");

            let store = SessionStore::open(db.clone());
            assert_eq!(store.session(), &Session::default());
        }
    }

    describe "on disk" {
        it "survives reopening the database file" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("retro.db");

            {
                let db = Database::open(&path).expect("Failed to open database");
                db.migrate().expect("Failed to run migrations");
                let mut store = SessionStore::open_with_key(db, "team-a");
                populate(&mut store);
            }

            let db = Database::open(&path).expect("Failed to reopen database");
            db.migrate().expect("Failed to run migrations");
            let store = SessionStore::open_with_key(db, "team-a");

            assert_eq!(store.cards().len(), 2);
            assert_eq!(store.topic_groups()[0].topic, "Sprint Review");
            assert_eq!(store.topic_groups()[0].votes, 1);
            assert_eq!(store.summary().total_votes, 2);
        }
    }
}
