use std::path::Path;

/// Detect the MIME type of a file from its leading bytes, falling back to the
/// file extension. Returns `None` when neither identifies the content.
pub fn detect_mime(bytes: &[u8], file_name: &str) -> Option<&'static str> {
    let sniffed = match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x25, 0x50, 0x44, 0x46, 0x2D, ..] => Some("application/pdf"),
        _ => None,
    };

    sniffed.or_else(|| {
        let guess = mime_from_extension(file_name);
        if guess.is_none() {
            tracing::warn!(
                "Unrecognized file format for '{}' (first 4 bytes: {:02X?})",
                file_name,
                &bytes[..bytes.len().min(4)]
            );
        }
        guess
    })
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
