use super::*;

#[test]
fn aria_checked_mirrors_the_flag() {
    assert_eq!(aria_checked(true), "true");
    assert_eq!(aria_checked(false), "false");
}

