use crate::{
    db::Store,
    error::ErrorKind,
    test_fixtures::{Person, Pet},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn seeded() -> (Store, Vec<String>) {
    let store = Store::in_memory("sparkle").unwrap();
    let ids = store
        .create_many(&[
            Person::new("Ada", "St Leonards", 46),
            Person::new("Bob", "St Leonards", 31),
            Person::new("Cyd", "Kew", 46),
            Person::new("Dee", "Richmond", 22),
        ])
        .unwrap();

    (store, ids)
}

fn names(records: &[Person]) -> Vec<&str> {
    records.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn single_predicate_matches_all_holders() {
    let (store, _) = seeded();
    let template = Person {
        address: "St Leonards".into(),
        ..Person::default()
    };

    let found = store.select(&template).unwrap();
    assert_eq!(found.len(), 2);

    let mut got = names(&found);
    got.sort_unstable();
    assert_eq!(got, vec!["Ada", "Bob"]);
}

#[test]
fn second_predicate_narrows_with_and() {
    let (store, ids) = seeded();
    let template = Person {
        address: "St Leonards".into(),
        age: 46,
        ..Person::default()
    };

    let found = store.select(&template).unwrap();

    assert_eq!(names(&found), vec!["Ada"]);
    assert_eq!(found[0].id, ids[0]);
}

#[test]
fn disjoint_predicates_match_nothing() {
    let (store, _) = seeded();
    let template = Person {
        address: "Kew".into(),
        age: 22,
        ..Person::default()
    };

    assert!(store.matching_ids(&template).unwrap().is_empty());
}

#[test]
fn all_default_template_matches_nothing() {
    let (store, _) = seeded();

    assert!(store.select(&Person::default()).unwrap().is_empty());
    assert!(store.matching_ids(&Person::default()).unwrap().is_empty());
}

#[test]
fn non_indexed_predicate_is_rejected() {
    let (store, _) = seeded();
    let template = Person {
        height: 1.8,
        ..Person::default()
    };

    let err = store.select(&template).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);
    assert!(err.message.contains("height"));
}

#[test]
fn matching_ids_come_back_in_id_order() {
    let (store, ids) = seeded();
    let template = Person {
        age: 46,
        ..Person::default()
    };

    let expected: Vec<_> = [&ids[0], &ids[2]]
        .into_iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    assert_eq!(store.matching_ids(&template).unwrap(), expected);
}

#[test]
fn text_value_prefix_does_not_match() {
    let (store, _) = seeded();
    let template = Person {
        address: "St".into(),
        ..Person::default()
    };

    assert!(store.select(&template).unwrap().is_empty());
}

#[test]
fn select_fields_restricts_hydration() {
    let (store, _) = seeded();
    let template = Person {
        address: "Kew".into(),
        ..Person::default()
    };

    let found = store.select_fields(&template, &["name"]).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Cyd");
    assert_eq!(found[0].address, "");
    assert_eq!(found[0].age, 0);
}

#[test]
fn index_follows_updates_and_deletes() {
    let (store, ids) = seeded();
    let kew = Person {
        address: "Kew".into(),
        ..Person::default()
    };
    let leonards = Person {
        address: "St Leonards".into(),
        ..Person::default()
    };

    store.update(&kew, [&ids[0]]).unwrap();
    assert_eq!(store.matching_ids(&leonards).unwrap(), vec![ids[1].clone()]);
    assert_eq!(store.matching_ids(&kew).unwrap().len(), 2);

    store.delete::<Person, _>([&ids[2]]).unwrap();
    assert_eq!(store.matching_ids(&kew).unwrap(), vec![ids[0].clone()]);
}

#[test]
fn queries_are_scoped_to_the_table() {
    let (store, _) = seeded();
    store
        .create(&Pet {
            owner: "Ada".into(),
            ..Pet::default()
        })
        .unwrap();

    let people = store
        .select(&Person {
            name: "Ada".into(),
            ..Person::default()
        })
        .unwrap();
    let pets = store
        .select(&Pet {
            owner: "Ada".into(),
            ..Pet::default()
        })
        .unwrap();

    assert_eq!(people.len(), 1);
    assert_eq!(pets.len(), 1);
}

#[test]
fn bool_index_matches_only_true() {
    let store = Store::in_memory("sparkle").unwrap();
    let on = store
        .create(&Person {
            active: true,
            ..Person::new("On", "x", 1)
        })
        .unwrap();
    store.create(&Person::new("Off", "x", 1)).unwrap();

    let template = Person {
        active: true,
        ..Person::default()
    };
    assert_eq!(store.matching_ids(&template).unwrap(), vec![on]);
}

#[test]
fn other_schema_in_same_file_is_not_matched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.redb");
    let kew = Person {
        address: "Kew".into(),
        ..Person::default()
    };

    let own = {
        let alpha = Store::open(&path, "alpha");
        let id = alpha.create(&Person::new("Ada", "Kew", 46)).unwrap();
        alpha.close();
        id
    };

    let beta = Store::open(&path, "beta");
    assert!(beta.matching_ids(&kew).unwrap().is_empty());
    let theirs = beta.create(&Person::new("Bob", "Kew", 31)).unwrap();
    assert_eq!(beta.matching_ids(&kew).unwrap(), vec![theirs]);
    beta.close();

    let alpha = Store::open(&path, "alpha");
    assert_eq!(alpha.matching_ids(&kew).unwrap(), vec![own]);
}

///
/// Op
/// One step of a random write sequence over a small pool of records.
///

#[derive(Clone, Debug)]
enum Op {
    Create(u8),
    Update(usize, u8),
    Delete(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4).prop_map(Op::Create),
        (0usize..8, 0u8..4).prop_map(|(i, a)| Op::Update(i, a)),
        (0usize..8).prop_map(Op::Delete),
    ]
}

fn address(n: u8) -> String {
    format!("street-{n}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // After any write sequence, each address query returns exactly the
    // live ids holding that address.
    #[test]
    fn index_matches_live_records(ops in prop::collection::vec(arb_op(), 1..24)) {
        let store = Store::in_memory("sparkle").unwrap();
        let mut live: Vec<(String, u8)> = Vec::new();

        for op in ops {
            match op {
                Op::Create(a) => {
                    let person = Person { address: address(a), ..Person::default() };
                    live.push((store.create(&person).unwrap(), a));
                }
                Op::Update(i, a) if !live.is_empty() => {
                    let i = i % live.len();
                    let template = Person { address: address(a), ..Person::default() };
                    store.update(&template, [&live[i].0]).unwrap();
                    live[i].1 = a;
                }
                Op::Delete(i) if !live.is_empty() => {
                    let (id, _) = live.remove(i % live.len());
                    store.delete::<Person, _>([&id]).unwrap();
                }
                _ => {}
            }
        }

        for a in 0u8..4 {
            let template = Person { address: address(a), ..Person::default() };
            let got: BTreeSet<_> = store.matching_ids(&template).unwrap().into_iter().collect();
            let want: BTreeSet<_> = live
                .iter()
                .filter(|(_, held)| *held == a)
                .map(|(id, _)| id.clone())
                .collect();
            prop_assert_eq!(got, want);
        }
    }
}
