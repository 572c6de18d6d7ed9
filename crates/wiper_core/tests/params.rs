use wiper_core::{ParamsError, RunParams, StrategyKind, ValidatedDiscovery};

#[test]
fn scan_without_target_keeps_current_page() {
    let params = RunParams {
        target: Some("   ".to_string()),
        ..RunParams::default()
    };
    assert_eq!(
        params.validate(),
        Ok(ValidatedDiscovery::Scan { channel: None })
    );
    assert_eq!(params.limit(), None);
}

#[test]
fn scan_target_must_be_a_web_url() {
    let params = RunParams {
        target: Some("ftp://discord.com/channels/1/2".to_string()),
        ..RunParams::default()
    };
    assert!(matches!(
        params.validate(),
        Err(ParamsError::UnsupportedScheme { field: "channel", .. })
    ));

    let params = RunParams {
        target: Some("not a url".to_string()),
        ..RunParams::default()
    };
    assert!(matches!(
        params.validate(),
        Err(ParamsError::InvalidUrl { field: "channel", .. })
    ));
}

#[test]
fn search_requires_author_and_server() {
    let mut params = RunParams {
        mode: StrategyKind::Search,
        server: Some("https://discord.com/channels/42".to_string()),
        limit: 5,
        ..RunParams::default()
    };
    assert_eq!(params.validate(), Err(ParamsError::MissingAuthor));

    params.author = Some(" alice ".to_string());
    params.server = None;
    assert_eq!(params.validate(), Err(ParamsError::MissingServer));

    params.server = Some("https://discord.com/channels/42".to_string());
    match params.validate() {
        Ok(ValidatedDiscovery::Search { server, author }) => {
            assert_eq!(author, "alice");
            assert_eq!(server.path(), "/channels/42");
        }
        other => panic!("unexpected validation result: {other:?}"),
    }
    assert_eq!(params.limit(), Some(5));
}
