use syscan_core::errors::{ErrorInfo, SyscanError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("file", "covmat.data")
        .with_context("reason", "example")
}

#[test]
fn input_error_surface() {
    let err = SyscanError::Input(sample_info("I001", "missing raw file"));
    assert_eq!(err.info().code, "I001");
    assert!(err.info().context.contains_key("file"));
}

#[test]
fn format_error_surface() {
    let err = SyscanError::Format(sample_info("F001", "rapidity out of range"));
    assert_eq!(err.info().code, "F001");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn decomposition_error_names_dataset() {
    let err = SyscanError::Decomposition(sample_info("D001", "negative eigenvalue"))
        .in_dataset("LHCBWMU1FB");
    assert!(matches!(err, SyscanError::Decomposition(_)));
    assert_eq!(
        err.info().context.get("dataset").map(String::as_str),
        Some("LHCBWMU1FB")
    );
    assert!(err.to_string().contains("dataset=LHCBWMU1FB"));
    let nested = err.in_dataset("OTHER");
    assert_eq!(
        nested.info().context.get("dataset").map(String::as_str),
        Some("LHCBWMU1FB")
    );
}

#[test]
fn display_shows_code_context_and_hint() {
    let err = SyscanError::Table(
        ErrorInfo::new("missing-source", "slot 3 was never filled")
            .at_point(4)
            .with_context("dataset", "CMSJETS11")
            .with_hint("set every direct slot"),
    );
    assert_eq!(
        err.to_string(),
        "table: [missing-source] slot 3 was never filled (dataset=CMSJETS11 point=4); hint: set every direct slot"
    );
}

#[test]
fn table_error_surface() {
    let err = SyscanError::Table(sample_info("T001", "width mismatch"));
    assert_eq!(err.info().code, "T001");
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = SyscanError::Config(ErrorInfo::new("C001", "bad yaml").with_hint("check indentation"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Config");
    assert_eq!(json["detail"]["hint"], "check indentation");
}
