use super::*;

#[test]
fn auto_and_all_carry_no_explicit_ids() {
    assert!(CredentialBinding::Auto.credential_ids().is_empty());
    assert!(CredentialBinding::All.credential_ids().is_empty());
}

#[test]
fn set_mode_carries_its_ids() {
    let ids = vec![CredentialId::new(), CredentialId::new()];
    let binding = CredentialBinding::Set { credential_ids: ids.clone() };
    assert_eq!(binding.credential_ids(), ids.as_slice());
}

#[test]
fn single_mode_with_one_id_is_well_formed() {
    let binding = CredentialBinding::Single { credential_ids: vec![CredentialId::new()] };
    assert!(binding.is_well_formed());
}

#[test]
fn single_mode_with_zero_or_many_ids_is_malformed() {
    assert!(!CredentialBinding::Single { credential_ids: vec![] }.is_well_formed());
    let many = vec![CredentialId::new(), CredentialId::new()];
    assert!(!CredentialBinding::Single { credential_ids: many }.is_well_formed());
}
