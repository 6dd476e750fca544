use super::*;

fn filled_form() -> SignupForm {
    SignupForm {
        first: "Ann".to_string(),
        last: "Lee".to_string(),
        number: "5551234".to_string(),
        region: "Texas".to_string(),
    }
}

#[test]
fn updating_one_field_leaves_the_others_untouched() {
    for field in FormField::ALL {
        let mut form = filled_form();
        let before = form.clone();
        form.update_field(field, "changed");

        assert_eq!(form.field(field), "changed");
        for other in FormField::ALL.into_iter().filter(|other| *other != field) {
            assert_eq!(form.field(other), before.field(other), "{other} changed");
        }
    }
}

#[test]
fn parses_the_four_input_names() {
    for field in FormField::ALL {
        assert_eq!(field.name().parse::<FormField>(), Ok(field));
    }
    assert_eq!(
        "email".parse::<FormField>(),
        Err(ValidationError::UnknownField("email".to_string()))
    );
}

#[test]
fn reports_first_empty_field_in_render_order() {
    let mut form = filled_form();
    form.update_field(FormField::Region, "");
    form.update_field(FormField::Last, "");

    assert_eq!(
        form.validate(&RegionSet::default()),
        Err(ValidationError::MissingField(FormField::Last))
    );
}

#[test]
fn missing_field_wins_over_invalid_region() {
    let mut form = filled_form();
    form.update_field(FormField::Number, "");
    form.update_field(FormField::Region, "Atlantis");

    assert_eq!(
        form.validate(&RegionSet::default()),
        Err(ValidationError::MissingField(FormField::Number))
    );
}

#[test]
fn rejects_regions_outside_the_set() {
    let mut form = filled_form();
    form.update_field(FormField::Region, "Atlantis");
    assert_eq!(
        form.validate(&RegionSet::default()),
        Err(ValidationError::InvalidRegion("Atlantis".to_string()))
    );

    form.update_field(FormField::Region, "texas");
    assert_eq!(
        form.validate(&RegionSet::default()),
        Err(ValidationError::InvalidRegion("texas".to_string()))
    );
}

#[test]
fn valid_form_copies_all_four_values() {
    let record = filled_form()
        .validate(&RegionSet::default())
        .expect("valid form");

    assert_eq!(
        record,
        SignupRecord {
            first: "Ann".to_string(),
            last: "Lee".to_string(),
            number: "5551234".to_string(),
            region: "Texas".to_string(),
        }
    );
    assert!(record.greeting().starts_with("Hey there, Ann."));
}

#[test]
fn record_serializes_to_a_document_without_an_id() {
    let record = filled_form()
        .validate(&RegionSet::default())
        .expect("valid form");
    let document = serde_json::to_value(&record).expect("serialize");

    assert_eq!(
        document,
        serde_json::json!({
            "first": "Ann",
            "last": "Lee",
            "number": "5551234",
            "region": "Texas",
        })
    );
    assert!(document.get("id").is_none());
}
