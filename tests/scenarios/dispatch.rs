use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use schemeshell::{
    BuiltinFactories, FactoryMap, LoaderClient, LoaderContext, ProtocolRequest, ProtocolResponse,
    ProtocolService, ResourceBody, ResourceResponse, SchemeLoaderFactory, TransportError,
};
use url::Url;

struct StaticFactory {
    bytes: &'static [u8],
}

impl SchemeLoaderFactory for StaticFactory {
    fn start(&self, _request: ProtocolRequest, client: LoaderClient) {
        client.succeed(ResourceResponse {
            mime_type: Some("text/html".to_string()),
            body: ResourceBody::Bytes(self.bytes.to_vec()),
        });
    }
}

fn load(factories: &FactoryMap, url: &str) -> Option<Result<ResourceResponse, TransportError>> {
    let parsed = Url::parse(url).expect("test url should parse");
    let factory = factories.get(parsed.scheme())?;
    let slot: Arc<Mutex<Option<Result<ResourceResponse, TransportError>>>> =
        Arc::new(Mutex::new(None));
    let client_slot = Arc::clone(&slot);
    let client = LoaderClient::new(move |result| {
        *client_slot.lock() = Some(result);
    });
    factory.start(ProtocolRequest::get(parsed), client);
    let delivered = slot.lock().take();
    delivered
}

fn loaded_bytes(factories: &FactoryMap, url: &str) -> Option<Vec<u8>> {
    match load(factories, url) {
        Some(Ok(ResourceResponse {
            body: ResourceBody::Bytes(bytes),
            ..
        })) => Some(bytes),
        _ => None,
    }
}

#[test]
fn registered_handler_and_stock_builtins_serve_a_network_context() {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .expect("temp file should be created");
    file.write_all(b"from disk")
        .expect("temp file should be writable");

    let service = ProtocolService::new();
    service
        .register_buffer_protocol("myapp", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(b"from handler".to_vec()))
        })
        .expect("registration should succeed");

    let mut factories = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::Network, &mut factories);

    assert_eq!(
        loaded_bytes(&factories, "myapp://host/resource").as_deref(),
        Some(b"from handler".as_slice())
    );

    let file_url = Url::from_file_path(file.path()).expect("temp path should convert to url");
    assert_eq!(
        loaded_bytes(&factories, file_url.as_str()).as_deref(),
        Some(b"from disk".as_slice())
    );

    assert_eq!(
        loaded_bytes(&factories, "data:text/plain,inline").as_deref(),
        Some(b"inline".as_slice())
    );

    assert!(load(&factories, "unhandled://host/x").is_none());
}

#[test]
fn http_interception_overrides_and_restores_the_builtin_factory() {
    let mut builtins = BuiltinFactories::default();
    builtins.insert_network_only("http", Arc::new(StaticFactory { bytes: b"builtin" }));

    let service = ProtocolService::with_builtins(builtins);
    service
        .intercept_buffer_protocol("http", |_request, sink| {
            sink.succeed(ProtocolResponse::Buffer(b"intercepted".to_vec()))
        })
        .expect("interception should succeed");

    let mut intercepted = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::Network, &mut intercepted);
    assert_eq!(
        loaded_bytes(&intercepted, "http://example.com/").as_deref(),
        Some(b"intercepted".as_slice())
    );

    service
        .unintercept_protocol("http")
        .expect("unintercept should succeed");

    let mut restored = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::Network, &mut restored);
    assert_eq!(
        loaded_bytes(&restored, "http://example.com/").as_deref(),
        Some(b"builtin".as_slice())
    );

    let mut isolated = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::NonNetwork, &mut isolated);
    assert!(!isolated.contains_key("http"));
}

#[test]
fn late_registration_affects_only_subsequently_built_maps() {
    let service = ProtocolService::new();

    let mut early = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::Network, &mut early);
    assert!(!early.contains_key("late"));

    service
        .register_string_protocol("late", |_request, sink| {
            sink.succeed(ProtocolResponse::String("now".to_string()))
        })
        .expect("registration should succeed");

    assert!(!early.contains_key("late"));

    let mut rebuilt = FactoryMap::new();
    service.register_url_loader_factories(LoaderContext::Network, &mut rebuilt);
    assert_eq!(
        loaded_bytes(&rebuilt, "late://host/x").as_deref(),
        Some(b"now".as_slice())
    );
}
