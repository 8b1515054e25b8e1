use crate::core::money::{drops_to_xrp_string, xrp_str_to_drops, DROPS_PER_XRP};

#[test]
fn whole_and_fractional_amounts_parse_exactly() {
    assert_eq!(xrp_str_to_drops("1"), Some(DROPS_PER_XRP));
    assert_eq!(xrp_str_to_drops("0.000001"), Some(1));
    assert_eq!(xrp_str_to_drops("0.00005"), Some(50));
    assert_eq!(xrp_str_to_drops("1.5"), Some(1_500_000));
    assert_eq!(xrp_str_to_drops("-0.5"), Some(-500_000));
    assert_eq!(xrp_str_to_drops(".5"), Some(500_000));
}

#[test]
fn sub_drop_precision_and_garbage_are_rejected() {
    // Seven fractional digits cannot be a whole number of drops.
    assert_eq!(xrp_str_to_drops("0.0000001"), None);
    assert_eq!(xrp_str_to_drops(""), None);
    assert_eq!(xrp_str_to_drops("."), None);
    assert_eq!(xrp_str_to_drops("1.2.3"), None);
    assert_eq!(xrp_str_to_drops("12a"), None);
    assert_eq!(xrp_str_to_drops("1e6"), None);
}

#[test]
fn formatting_round_trips_through_parsing() {
    for drops in [0, 1, 50, 999_999, 1_000_000, 1_500_000, -42, i64::from(i32::MAX)] {
        let formatted = drops_to_xrp_string(drops);
        assert_eq!(xrp_str_to_drops(&formatted), Some(drops), "via {}", formatted);
    }
    assert_eq!(drops_to_xrp_string(1_500_000), "1.5");
    assert_eq!(drops_to_xrp_string(1), "0.000001");
    assert_eq!(drops_to_xrp_string(2_000_000), "2");
}
