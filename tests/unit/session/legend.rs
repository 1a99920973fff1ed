use super::*;

fn entry(cat: &str) -> LegendEntryDef {
    LegendEntryDef {
        category: CategoryId::from(cat),
        label: format!("{cat} events"),
        color: Some(Rgba8::rgb(0, 0, 255)),
        shape: None,
    }
}

#[test]
fn rows_wrap_every_n_columns() {
    let legend = Legend::new(vec![entry("a"), entry("b"), entry("c")], 2).unwrap();
    let rows = legend.rows(&ActiveCategories::all());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[1][0].category, CategoryId::from("c"));
    assert!(rows.iter().flatten().all(|k| k.active));
}

#[test]
fn keys_reflect_the_filter() {
    let legend = Legend::new(vec![entry("a"), entry("b")], 1).unwrap();
    let mut active = ActiveCategories::all();
    active.toggle(&CategoryId::from("b"));
    let rows = legend.rows(&active);
    assert!(rows[0][0].active);
    assert!(!rows[1][0].active);
}

#[test]
fn none_active_switches_off_only_legend_categories() {
    let legend = Legend::new(vec![entry("a"), entry("b")], 2).unwrap();
    let off = legend.none_active();
    assert!(!off.is_active(&CategoryId::from("a")));
    assert!(!off.is_active(&CategoryId::from("b")));
    assert!(off.is_active(&CategoryId::from("unlisted")));
}

#[test]
fn zero_columns_is_rejected() {
    assert!(Legend::new(vec![entry("a")], 0).unwrap_err().is_configuration());
}

#[test]
fn legends_compare_by_entries_and_columns() {
    let a = Legend::new(vec![entry("a"), entry("b")], 2).unwrap();
    assert_eq!(a, a.clone());
    assert_ne!(a, Legend::new(vec![entry("a"), entry("b")], 1).unwrap());
    assert_ne!(a, Legend::new(vec![entry("a")], 2).unwrap());
}
