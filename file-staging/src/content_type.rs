//! Content type to file extension mapping and staged object naming

use mime::Mime;
use uuid::Uuid;

/// Content types and their extensions; the first extension of each entry is the one
/// used when naming objects
const CONTENT_TYPES: &[(&str, &[&str])] = &[
    // Images
    ("image/png", &["png"]),
    ("image/jpeg", &["jpeg", "jpg", "jpe"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("image/avif", &["avif"]),
    ("image/heic", &["heic"]),
    ("image/heif", &["heif"]),
    ("image/bmp", &["bmp"]),
    ("image/tiff", &["tif", "tiff"]),
    ("image/svg+xml", &["svg", "svgz"]),
    ("image/x-icon", &["ico"]),
    // Audio
    ("audio/mpeg", &["mpga", "mp2", "mp2a", "mp3", "m2a", "m3a"]),
    ("audio/mp4", &["m4a", "mp4a"]),
    ("audio/aac", &["aac"]),
    ("audio/ogg", &["oga", "ogg", "spx", "opus"]),
    ("audio/wav", &["wav"]),
    ("audio/webm", &["weba"]),
    ("audio/flac", &["flac"]),
    // Video
    ("video/mp4", &["mp4", "mp4v", "mpg4"]),
    ("video/mpeg", &["mpeg", "mpg", "mpe", "m1v", "m2v"]),
    ("video/quicktime", &["qt", "mov"]),
    ("video/webm", &["webm"]),
    ("video/ogg", &["ogv"]),
    ("video/x-msvideo", &["avi"]),
    ("video/x-matroska", &["mkv"]),
    ("video/3gpp", &["3gp", "3gpp"]),
    ("video/x-m4v", &["m4v"]),
    // Text
    ("text/plain", &["txt", "text", "conf", "def", "list", "log", "in", "ini"]),
    ("text/html", &["html", "htm", "shtml"]),
    ("text/css", &["css"]),
    ("text/csv", &["csv"]),
    ("text/markdown", &["md", "markdown"]),
    ("text/calendar", &["ics", "ifb"]),
    // Applications
    ("application/json", &["json", "map"]),
    ("application/pdf", &["pdf"]),
    ("application/zip", &["zip"]),
    ("application/gzip", &["gz"]),
    ("application/x-tar", &["tar"]),
    ("application/x-7z-compressed", &["7z"]),
    ("application/vnd.rar", &["rar"]),
    (
        "application/octet-stream",
        &["bin", "exe", "dll", "deb", "dmg", "iso", "img", "msi", "so"],
    ),
    ("application/javascript", &["js", "mjs"]),
    ("application/xml", &["xml", "xsl", "xsd", "rng"]),
    ("application/rtf", &["rtf"]),
    ("application/msword", &["doc", "dot"]),
    ("application/vnd.ms-excel", &["xls", "xlm", "xla", "xlc", "xlt", "xlw"]),
    ("application/vnd.ms-powerpoint", &["ppt", "pps", "pot"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["xlsx"],
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        &["pptx"],
    ),
    ("application/vnd.oasis.opendocument.text", &["odt"]),
    ("application/vnd.oasis.opendocument.spreadsheet", &["ods"]),
    ("application/epub+zip", &["epub"]),
    ("application/wasm", &["wasm"]),
    // Fonts
    ("font/ttf", &["ttf"]),
    ("font/otf", &["otf"]),
    ("font/woff", &["woff"]),
    ("font/woff2", &["woff2"]),
];

/// Unregistered or legacy content types that clients still send, with their extension
///
/// Only consulted when naming objects; file names never resolve back to these types.
const ALIASES: &[(&str, &str)] = &[
    ("image/x-ms-bmp", "bmp"),
    ("image/vnd.microsoft.icon", "ico"),
    ("audio/mp3", "mp3"),
    ("audio/x-wav", "wav"),
    ("audio/wave", "wav"),
    ("audio/x-m4a", "m4a"),
    ("audio/x-aac", "aac"),
    ("audio/x-flac", "flac"),
    ("text/xml", "xml"),
    ("text/javascript", "js"),
    ("application/x-zip-compressed", "zip"),
];

/// Preferred file extension for a content type
///
/// Parameters such as `; charset=utf-8` and letter case are ignored.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.parse::<Mime>().ok()?.essence_str().to_ascii_lowercase();

    CONTENT_TYPES
        .iter()
        .find(|(mime_type, _)| *mime_type == essence)
        .and_then(|(_, extensions)| extensions.first().copied())
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == essence)
                .map(|(_, extension)| *extension)
        })
}

/// Content type for a file name, derived from its extension
///
/// Returns `None` if the name has no extension or the extension is not registered.
#[must_use]
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    CONTENT_TYPES
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension.as_str()))
        .map(|(mime_type, _)| *mime_type)
}

/// Unique object name `<uuid-v4>.<extension>` for a content type
///
/// Returns `None` if the content type has no registered extension.
#[must_use]
pub fn unique_object_name(content_type: &str) -> Option<String> {
    let extension = extension_for(content_type)?;
    Some(format!("{}.{extension}", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_common_types() {
        assert_eq!(extension_for("text/plain"), Some("txt"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("application/pdf"), Some("pdf"));
        assert_eq!(extension_for("video/quicktime"), Some("qt"));
    }

    #[test]
    fn test_extension_for_xml() {
        assert_eq!(extension_for("application/xml"), Some("xml"));
        assert_eq!(extension_for("text/xml"), Some("xml"));
        assert_eq!(content_type_for("feed.xml"), Some("application/xml"));
        assert_eq!(content_type_for("style.xsl"), Some("application/xml"));
    }

    #[test]
    fn test_extension_for_aliases() {
        assert_eq!(extension_for("audio/mp3"), Some("mp3"));
        assert_eq!(extension_for("audio/x-wav"), Some("wav"));
        assert_eq!(extension_for("audio/x-m4a"), Some("m4a"));
        assert_eq!(extension_for("image/x-ms-bmp"), Some("bmp"));
        assert_eq!(extension_for("Audio/MP3; codecs=mp3"), Some("mp3"));

        // Names resolve to the registered type, never the alias
        assert_eq!(content_type_for("song.mp3"), Some("audio/mpeg"));
        assert_eq!(content_type_for("clip.wav"), Some("audio/wav"));
        assert_eq!(content_type_for("voice.m4a"), Some("audio/mp4"));
        assert_eq!(content_type_for("scan.bmp"), Some("image/bmp"));
    }

    #[test]
    fn test_alias_extensions_are_registered() {
        for (alias, extension) in ALIASES {
            assert!(
                content_type_for(&format!("name.{extension}")).is_some(),
                "alias {alias} names objects with unregistered extension {extension}"
            );
        }
    }

    #[test]
    fn test_extension_for_ignores_params_and_case() {
        assert_eq!(extension_for("text/plain; charset=utf-8"), Some("txt"));
        assert_eq!(extension_for("Image/PNG"), Some("png"));
    }

    #[test]
    fn test_extension_for_unknown_types() {
        assert_eq!(extension_for("application/x-unknown"), None);
        assert_eq!(extension_for("not a mime type"), None);
        assert_eq!(extension_for(""), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("abc123.png"), Some("image/png"));
        assert_eq!(content_type_for("abc123.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("notes.txt"), Some("text/plain"));
        assert_eq!(content_type_for("archive.tar.gz"), Some("application/gzip"));
        assert_eq!(content_type_for("no-extension"), None);
        assert_eq!(content_type_for("file.unknownext"), None);
    }

    #[test]
    fn test_every_preferred_extension_maps_back() {
        for (mime_type, _) in CONTENT_TYPES {
            let extension = extension_for(mime_type).unwrap();
            assert_eq!(
                content_type_for(&format!("name.{extension}")),
                Some(*mime_type),
                "extension {extension} does not map back to {mime_type}"
            );
        }
    }

    #[test]
    fn test_unique_object_name() {
        let first = unique_object_name("image/png").unwrap();
        let second = unique_object_name("image/png").unwrap();

        assert!(first.ends_with(".png"));
        assert_eq!(first.len(), 36 + ".png".len());
        assert_ne!(first, second);
        assert!(unique_object_name("application/x-unknown").is_none());
    }
}
