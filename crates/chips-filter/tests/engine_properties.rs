//! Property tests for the filter engine.
//!
//! Drives the engine with long seeded random operation sequences over a
//! catalog that uses every option feature, checking the item and option-list
//! invariants after each step.

use chips_filter_rs::{
    same_option, sort_items, FilterEngine, FilterOption, Item, OptionRef, OptionType, Qualifier,
    Value,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

fn catalog() -> Vec<OptionRef> {
    vec![
        FilterOption::new("Report", OptionType::Integer)
            .readonly()
            .shared(),
        FilterOption::new("Branch", OptionType::Integer)
            .required()
            .shared(),
        FilterOption::new("Open", OptionType::Tag).shared(),
        FilterOption::new("Label", OptionType::String)
            .allow_multiple()
            .shared(),
        FilterOption::new("On", OptionType::Date)
            .alternative_of("when")
            .shared(),
        FilterOption::new("From", OptionType::Date)
            .in_group("range")
            .alternative_of("when")
            .shared(),
        FilterOption::new("To", OptionType::Date)
            .in_group("range")
            .alternative_of("when")
            .shared(),
        FilterOption::new("Sort", OptionType::String)
            .with_qualifiers(vec![
                Qualifier::new(Some("arrow_upward"), "asc"),
                Qualifier::new(Some("arrow_downward"), "desc"),
            ])
            .shared(),
    ]
}

fn raw_values() -> Vec<Option<Value>> {
    vec![
        None,
        Some(Value::text("680")),
        Some(Value::text("abc")),
        Some(Value::text("1,250.5")),
        Some(Value::Integer(5)),
        Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
    ]
}

fn step(engine: &mut FilterEngine, rng: &mut StdRng) {
    let keys: Vec<_> = engine.items().iter().map(Item::key).collect();

    match rng.random_range(0..11) {
        0 => {
            let titles = ["b", "o", "from", "to", "la", "zzz", ""];
            let text = *titles.choose(rng).unwrap();
            engine.set_option_text(text);
        }
        1 => {
            let filtered = engine.filtered_options().to_vec();
            if let Some(option) = filtered.choose(rng) {
                engine.select_option(option.clone());
            }
        }
        2 => {
            let values = raw_values();
            let value = values.choose(rng).unwrap().clone();
            let _ = engine.set_value(value);
        }
        3 => engine.add(false),
        4 => engine.add(true),
        5 => {
            if let Some(key) = keys.choose(rng) {
                engine.edit(*key);
            }
        }
        6 => {
            if let Some(key) = keys.choose(rng) {
                engine.remove(*key);
            }
        }
        7 => {
            if let Some(key) = keys.choose(rng) {
                engine.toggle_qualifier(*key);
            }
        }
        8 => engine.cancel(rng.random_bool(0.5)),
        9 => engine.tick(),
        _ => {
            engine.toggle_draft_qualifier();
        }
    }
}

fn check_invariants(engine: &FilterEngine, options: &[OptionRef], context: &str) {
    let items = engine.items();

    for option in options.iter().filter(|o| !o.allow_multiple) {
        let count = items
            .iter()
            .filter(|i| same_option(&i.option, option))
            .count();
        assert!(count <= 1, "{context}: '{}' committed {count} times", option.title);
    }

    for a in items {
        for b in items {
            if a.option.alternative.is_some() && a.option.alternative == b.option.alternative {
                assert_eq!(
                    a.option.group, b.option.group,
                    "{context}: variants '{}' and '{}' split across groups",
                    a.option.title, b.option.title
                );
            }
        }
    }

    for option in options.iter().filter(|o| o.required) {
        assert!(
            items.iter().any(|i| same_option(&i.option, option)),
            "{context}: required '{}' missing",
            option.title
        );
    }

    let mut resorted = items.to_vec();
    sort_items(options, &mut resorted);
    let before: Vec<_> = items.iter().map(Item::key).collect();
    let after: Vec<_> = resorted.iter().map(Item::key).collect();
    assert_eq!(before, after, "{context}: items out of catalog order");

    for option in engine.filtered_options() {
        let consumed = items.iter().any(|i| {
            same_option(&i.option, option)
                && !i.option.allow_multiple
                && Some(i.key()) != engine.editing()
        });
        assert!(
            !consumed,
            "{context}: consumed option '{}' still selectable",
            option.title
        );
    }
}

#[test]
fn test_invariants_hold_across_random_sequences() {
    for seed in 1..=40u64 {
        let options = catalog();
        let mut engine = FilterEngine::new(
            options.clone(),
            vec![Item::new(options[0].clone(), Some(Value::Integer(1203001)))],
        );
        let mut rng = StdRng::seed_from_u64(seed);

        check_invariants(&engine, &options, &format!("seed {seed}, initial"));
        for n in 0..250 {
            step(&mut engine, &mut rng);
            check_invariants(&engine, &options, &format!("seed {seed}, step {n}"));
        }
    }
}

#[test]
fn test_protected_items_survive_removal() {
    let options = catalog();
    let mut engine = FilterEngine::new(
        options.clone(),
        vec![Item::new(options[0].clone(), Some(Value::Integer(1203001)))],
    );
    let snapshot: Vec<_> = engine.items().iter().map(Item::key).collect();

    for key in snapshot.clone() {
        engine.remove(key);
    }

    let after: Vec<_> = engine.items().iter().map(Item::key).collect();
    assert_eq!(snapshot, after);
}

#[test]
fn test_sort_keeps_groups_contiguous() {
    let options = catalog();
    let (from, to, label) = (options[5].clone(), options[6].clone(), options[3].clone());
    let mut items = vec![
        Item::new(from.clone(), None),
        Item::new(label.clone(), None),
        Item::new(to.clone(), None),
        Item::new(label, None),
    ];
    sort_items(&options, &mut items);

    let titles: Vec<_> = items.iter().map(|i| i.option.title.as_str()).collect();
    assert_eq!(titles, vec!["Label", "Label", "From", "To"]);
}
