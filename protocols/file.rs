/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Stock `file:` loader factory.

use std::fs;

use crate::protocols::{ProtocolRequest, TransportError};
use crate::registries::domain::loader::{
    LoaderClient, ResourceBody, ResourceResponse, SchemeLoaderFactory,
};

#[derive(Debug, Default)]
pub struct FileLoaderFactory;

impl SchemeLoaderFactory for FileLoaderFactory {
    fn start(&self, request: ProtocolRequest, client: LoaderClient) {
        let Ok(path) = request.url.to_file_path() else {
            client.fail(TransportError::Failed(format!(
                "'{}' does not name a loadable file path",
                request.url
            )));
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                let mime_type = mime_guess::from_path(&path).first_raw().map(str::to_string);
                client.succeed(ResourceResponse {
                    mime_type,
                    body: ResourceBody::Bytes(bytes),
                });
            }
            Err(error) => client.fail(TransportError::Failed(format!(
                "failed to read '{}': {error}",
                path.display()
            ))),
        }
    }
}
