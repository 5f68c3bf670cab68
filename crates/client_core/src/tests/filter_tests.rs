use super::*;
use crate::test_support::{employee, employees};
use shared::domain::{Employee, RecordStatus};

fn dimensions() -> Vec<FilterDimension> {
    vec![
        FilterDimension::text("search", &["nome", "apelido"], &["cpf"]),
        FilterDimension::categorical("status", "status"),
    ]
}

fn search(items: &[Employee], term: &str) -> Vec<Employee> {
    let mut state = FilterState::default();
    state.set("search", term);
    apply(items, &state, &dimensions())
}

#[test]
fn digits_typed_alone_match_a_formatted_identifier() {
    let items = vec![
        employee(1, "Ana Souza", "123.456.789-00"),
        employee(2, "Bruno Lima", "987.654.321-00"),
    ];

    let found = search(&items, "123");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ana Souza");

    let found = search(&items, "12345678900");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ana Souza");

    let found = search(&items, "456789");
    assert_eq!(found.len(), 1);
}

#[test]
fn text_search_is_case_insensitive_over_every_searchable_field() {
    let mut with_nickname = employee(2, "Bruno Lima", "987.654.321-00");
    with_nickname.nickname = Some("Bruninho".into());
    let items = vec![employee(1, "Ana Souza", "123.456.789-00"), with_nickname];

    assert_eq!(search(&items, "SOUZA").len(), 1);
    assert_eq!(search(&items, "bruninho")[0].name, "Bruno Lima");
    assert!(search(&items, "carla").is_empty());
}

#[test]
fn letters_only_term_does_not_match_identifiers_by_digits() {
    let items = vec![employee(1, "Ana", "123.456.789-00")];
    assert!(search(&items, "xyz").is_empty());
}

#[test]
fn active_dimensions_are_combined_with_and() {
    let mut inactive = employee(2, "Ana Paula", "222.222.222-22");
    inactive.status = RecordStatus::Inactive;
    let items = vec![employee(1, "Ana Souza", "111.111.111-11"), inactive];

    let mut state = FilterState::default();
    state.set("search", "ana");
    state.set("status", "inativo");
    let found = apply(&items, &state, &dimensions());

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ana Paula");
}

#[test]
fn empty_values_and_unknown_dimensions_are_inactive() {
    let items = employees(5);
    let mut state = FilterState::default();
    state.set("search", "");
    state.set("unknown", "whatever");
    state.set("status", "   ");

    assert_eq!(apply(&items, &state, &dimensions()), items);
}

#[test]
fn filtered_view_is_a_subset_of_the_collection() {
    let items = employees(30);
    for term in ["", "0", "1", "Employee 2", "000.000.000-1", "zzz", "-"] {
        let found = search(&items, term);
        assert!(found.len() <= items.len());
        for record in &found {
            assert!(items.iter().any(|source| source.id == record.id), "term={term}");
        }
    }
}

#[test]
fn set_reports_whether_the_value_changed() {
    let mut state = FilterState::default();
    assert!(state.set("search", "ana"));
    assert!(!state.set("search", "ana"));
    assert!(state.set("search", ""));
    assert!(!state.set("search", ""));
    assert!(state.is_empty());
}

#[test]
fn digits_only_strips_punctuation() {
    assert_eq!(digits_only("123.456.789-00"), "12345678900");
    assert_eq!(digits_only("abc"), "");
}

#[test]
fn name_with_a_number_does_not_fall_back_to_identifier_digits() {
    let items = employees(25);

    let found = search(&items, "Employee 2");

    let names: Vec<&str> = found.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Employee 20",
            "Employee 21",
            "Employee 22",
            "Employee 23",
            "Employee 24",
            "Employee 25"
        ]
    );
}

#[test]
fn partially_formatted_identifier_still_matches() {
    let items = vec![
        employee(1, "Ana Souza", "123.456.789-00"),
        employee(2, "Bruno Lima", "987.654.321-00"),
    ];

    let found = search(&items, "123.456");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ana Souza");
}

#[test]
fn identifier_shape_needs_digits_and_only_punctuation_besides() {
    assert!(looks_like_identifier("123.456.789-00"));
    assert!(looks_like_identifier("12.345.678/0001-90"));
    assert!(!looks_like_identifier("Employee 2"));
    assert!(!looks_like_identifier("-./"));
}
