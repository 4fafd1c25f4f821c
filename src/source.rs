use std::io::Read;
use std::path::Path;

use crate::config::Hyperparameters;
use crate::error::{CodesimError, CodesimResult};

/// Recognized source extensions and the language reported for each.
pub const ALLOWED_EXTENSIONS: [(&str, &str); 10] = [
    ("py", "Python"),
    ("go", "Go"),
    ("java", "Java"),
    ("c", "C"),
    ("cpp", "C++"),
    ("cs", "C#"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
];

pub fn language_for(extension: &str) -> Option<&'static str> {
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

pub fn allowed_extensions() -> String {
    ALLOWED_EXTENSIONS
        .iter()
        .map(|(ext, _)| *ext)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lowercased text after the last `.`, or an empty string when there is no
/// dot.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Decode UTF-8, dropping any bytes that are not part of a valid sequence.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Read a whole stream under the size limit and decode it lossily.
///
/// At most one byte past the limit is buffered, so an oversized stream is
/// rejected without being loaded in full. `label` names the stream in the
/// error.
pub fn read_text<R: Read>(reader: R, label: &str, hp: &Hyperparameters) -> CodesimResult<String> {
    let mut bytes = Vec::new();
    reader
        .take(hp.max_file_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    check_size(label, bytes.len() as u64, hp)?;
    Ok(decode_lossy(&bytes))
}

/// A submitted source file that passed intake checks.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub extension: String,
    pub language: &'static str,
    pub text: String,
}

impl SourceFile {
    pub fn from_bytes(filename: &str, bytes: &[u8], hp: &Hyperparameters) -> CodesimResult<Self> {
        let extension = check_name(filename)?;
        check_size(filename, bytes.len() as u64, hp)?;
        Ok(Self::build(filename, extension, decode_lossy(bytes)))
    }

    /// Read a file from disk. The size limit is checked against the file's
    /// metadata before any content is loaded.
    pub fn read(path: &Path, hp: &Hyperparameters) -> CodesimResult<Self> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = check_name(&filename)?;
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CodesimError::MissingFile(path.display().to_string()),
            _ => CodesimError::Io(e),
        })?;
        check_size(&filename, metadata.len(), hp)?;
        let bytes = std::fs::read(path)?;
        check_size(&filename, bytes.len() as u64, hp)?;
        Ok(Self::build(&filename, extension, decode_lossy(&bytes)))
    }

    fn build(filename: &str, extension: String, text: String) -> Self {
        let language = language_for(&extension).unwrap_or("Unknown");
        Self {
            filename: filename.to_string(),
            extension,
            language,
            text,
        }
    }
}

fn check_name(filename: &str) -> CodesimResult<String> {
    if filename.is_empty() {
        return Err(CodesimError::EmptyFilename);
    }
    let extension = extension_of(filename);
    if language_for(&extension).is_none() {
        tracing::warn!("Rejected {filename}: extension not allowed");
        return Err(CodesimError::DisallowedExtension {
            filename: filename.to_string(),
            allowed: allowed_extensions(),
        });
    }
    Ok(extension)
}

fn check_size(filename: &str, size: u64, hp: &Hyperparameters) -> CodesimResult<()> {
    if size > hp.max_file_bytes {
        tracing::warn!("Rejected {filename}: {size} bytes");
        return Err(CodesimError::FileTooLarge {
            filename: filename.to_string(),
            size,
            limit: hp.max_file_bytes,
        });
    }
    Ok(())
}

/// Both files must carry the same extension.
pub fn check_pair(first: &SourceFile, second: &SourceFile) -> CodesimResult<()> {
    if first.extension != second.extension {
        tracing::warn!(
            "Rejected pair: .{} vs .{}",
            first.extension,
            second.extension
        );
        return Err(CodesimError::MismatchedExtensions {
            first: first.extension.clone(),
            second: second.extension.clone(),
        });
    }
    Ok(())
}
