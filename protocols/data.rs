/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Stock `data:` loader factory.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::protocols::{ProtocolRequest, TransportError};
use crate::registries::domain::loader::{
    LoaderClient, ResourceBody, ResourceResponse, SchemeLoaderFactory,
};

#[derive(Debug, Default)]
pub struct DataLoaderFactory;

impl SchemeLoaderFactory for DataLoaderFactory {
    fn start(&self, request: ProtocolRequest, client: LoaderClient) {
        let raw = request.url.as_str();
        let Some(content) = raw.strip_prefix("data:") else {
            client.fail(TransportError::Failed(format!(
                "'{raw}' is not a data url"
            )));
            return;
        };
        let Some((metadata, payload)) = content.split_once(',') else {
            client.fail(TransportError::Failed(
                "data url is missing its payload separator".to_string(),
            ));
            return;
        };

        let is_base64 = metadata.to_ascii_lowercase().ends_with(";base64");
        let media_type = metadata
            .split(';')
            .next()
            .filter(|value| !value.is_empty())
            .unwrap_or("text/plain")
            .to_ascii_lowercase();

        let bytes = if is_base64 {
            match STANDARD.decode(payload) {
                Ok(bytes) => bytes,
                Err(error) => {
                    client.fail(TransportError::Failed(format!(
                        "data url payload is not valid base64: {error}"
                    )));
                    return;
                }
            }
        } else {
            payload.as_bytes().to_vec()
        };

        client.succeed(ResourceResponse {
            mime_type: Some(media_type),
            body: ResourceBody::Bytes(bytes),
        });
    }
}
