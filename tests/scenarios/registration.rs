use schemeshell::{ProtocolError, ProtocolResponse, ProtocolService, ProtocolType};

#[test]
fn register_protocol_lifecycle_follows_the_error_contract() {
    let service = ProtocolService::new();

    assert_eq!(
        service.register_protocol(ProtocolType::Buffer, "myapp", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(b"payload".to_vec()))
        }),
        Ok(())
    );
    assert!(service.is_protocol_registered("myapp"));

    assert_eq!(
        service.register_protocol(ProtocolType::Buffer, "myapp", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(Vec::new()))
        }),
        Err(ProtocolError::Registered)
    );

    assert_eq!(service.unregister_protocol("myapp"), Ok(()));
    assert!(!service.is_protocol_registered("myapp"));
    assert_eq!(
        service.unregister_protocol("myapp"),
        Err(ProtocolError::NotRegistered)
    );
}

#[test]
fn registration_and_interception_coexist_per_scheme() {
    let service = ProtocolService::new();

    service
        .register_string_protocol("dual", |_request, sink| {
            sink.succeed(ProtocolResponse::String("registered".to_string()))
        })
        .expect("registration should succeed");
    service
        .intercept_string_protocol("dual", |_request, sink| {
            sink.succeed(ProtocolResponse::String("intercepted".to_string()))
        })
        .expect("interception should succeed");

    assert!(service.is_protocol_registered("dual"));
    assert!(service.is_protocol_intercepted("dual"));
    assert_eq!(service.intercept_handlers(), vec!["dual".to_string()]);

    service
        .unintercept_protocol("dual")
        .expect("unintercept should succeed");
    assert!(service.is_protocol_registered("dual"));
    assert!(!service.is_protocol_intercepted("dual"));
}

#[test]
fn handled_query_spans_builtins_registrations_and_interceptions() {
    let service = ProtocolService::new();

    assert!(service.is_protocol_handled("file"));
    assert!(service.is_protocol_handled("data"));
    assert!(!service.is_protocol_handled("ghost"));

    service
        .intercept_buffer_protocol("ghost", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(Vec::new()))
        })
        .expect("interception should succeed");
    assert!(service.is_protocol_handled("ghost"));
}

#[test]
fn registry_mutations_report_on_diagnostics_channels() {
    let rx = crate::diagnostics();

    let service = ProtocolService::new();
    service
        .register_buffer_protocol("observed", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(Vec::new()))
        })
        .expect("registration should succeed");
    let _ = service.register_buffer_protocol("observed", |_request, sink| {
        sink.succeed(ProtocolResponse::Buffer(Vec::new()))
    });
    service
        .unregister_protocol("observed")
        .expect("unregistration should succeed");

    let events: Vec<_> = rx.try_iter().collect();
    let count = |channel: &str| {
        events
            .iter()
            .filter(|event| event.channel_id() == channel)
            .count()
    };
    assert!(count("registry.protocol.register_succeeded") > 0);
    assert!(count("registry.protocol.register_rejected") > 0);
    assert!(count("registry.protocol.unregister_succeeded") > 0);
}
