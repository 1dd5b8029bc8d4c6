#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tunnel_binary::manifest::{BinaryEntry, VersionManifest, save_local_manifest};
use tunnel_binary::models::platform::PlatformKey;

/// Zip archive holding a single `name` entry.
pub fn zip_with(name: &str, content: &[u8]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options: zip::write::FileOptions<'_, ()> = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        zip.start_file(name, options).unwrap();
        zip.write_all(content).unwrap();
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// Manifest publishing `archive` for `platform` at `url`.
pub fn manifest_for(
    platform: PlatformKey,
    url: &str,
    archive: &str,
    hash: &str,
) -> VersionManifest {
    let mut manifest = VersionManifest::default();
    manifest.insert(
        &platform,
        BinaryEntry {
            new_http_path: url.to_string(),
            new_binary_name: archive.to_string(),
            hash: hash.to_string(),
            ..Default::default()
        },
    );
    manifest
}

pub fn write_manifest(manifest: &VersionManifest, path: &Path) {
    save_local_manifest(manifest, path).unwrap();
}

pub fn write_remote_manifest(manifest: &VersionManifest, path: &Path) {
    fs::write(path, serde_json::to_string_pretty(manifest).unwrap()).unwrap();
}
