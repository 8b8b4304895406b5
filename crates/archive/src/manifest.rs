//! Reading and rewriting the `solution.xml` manifest of a package
//!
//! The manifest is only ever touched textually: identity fields are located
//! inside the `<SolutionManifest>` element and the holding rename swaps the
//! text of the first `<UniqueName>` element, so every other byte of the
//! document survives unchanged.

use regex::Regex;
use soldeploy_errors::ArchiveError;
use soldeploy_types::SolutionVersion;
use std::io::{Read, Seek};
use std::path::Path;

/// Zip entry holding the package manifest
pub const MANIFEST_ENTRY: &str = "solution.xml";

/// Identity fields read from a package manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionManifest {
    pub unique_name: String,
    pub version: SolutionVersion,
}

fn manifest_body_regex() -> Result<Regex, ArchiveError> {
    Regex::new(r"(?s)<SolutionManifest\b[^>]*>(.*?)</SolutionManifest>").map_err(|e| {
        ArchiveError::Corrupt {
            path: MANIFEST_ENTRY.to_string(),
            message: format!("failed to compile manifest pattern: {e}"),
        }
    })
}

fn element_regex(element: &str) -> Result<Regex, ArchiveError> {
    Regex::new(&format!(r"(?s)<{element}>\s*(.*?)\s*</{element}>")).map_err(|e| {
        ArchiveError::Corrupt {
            path: MANIFEST_ENTRY.to_string(),
            message: format!("failed to compile {element} pattern: {e}"),
        }
    })
}

fn field<'a>(body: &'a str, element: &str, path: &Path) -> Result<&'a str, ArchiveError> {
    let re = element_regex(element)?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ArchiveError::InvalidManifestField {
            path: path.display().to_string(),
            field: element.to_string(),
            value: String::new(),
        })
}

/// Parse identity fields out of manifest text.
///
/// # Errors
///
/// Returns an `ArchiveError` if the document has no `<SolutionManifest>`
/// element or its `<UniqueName>`/`<Version>` fields are absent or invalid.
pub fn parse_manifest(xml: &str, path: &Path) -> Result<SolutionManifest, ArchiveError> {
    let body = manifest_body_regex()?
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ArchiveError::corrupt(path, "no <SolutionManifest> element"))?
        .as_str();

    let unique_name = field(body, "UniqueName", path)?;
    let raw_version = field(body, "Version", path)?;
    let version =
        raw_version
            .parse::<SolutionVersion>()
            .map_err(|_| ArchiveError::InvalidManifestField {
                path: path.display().to_string(),
                field: "Version".to_string(),
                value: raw_version.to_string(),
            })?;

    Ok(SolutionManifest {
        unique_name: unique_name.to_string(),
        version,
    })
}

/// Replace the text of the first `<UniqueName>` inside `<SolutionManifest>`.
///
/// # Errors
///
/// Returns an `ArchiveError` if there is no unique name to replace.
pub fn rename_unique_name(xml: &str, new_name: &str, path: &Path) -> Result<String, ArchiveError> {
    let body = manifest_body_regex()?
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ArchiveError::corrupt(path, "no <SolutionManifest> element"))?;

    let name = element_regex("UniqueName")?
        .captures(body.as_str())
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ArchiveError::InvalidManifestField {
            path: path.display().to_string(),
            field: "UniqueName".to_string(),
            value: String::new(),
        })?;

    let start = body.start() + name.start();
    let end = body.start() + name.end();

    let mut rewritten = String::with_capacity(xml.len() + new_name.len());
    rewritten.push_str(&xml[..start]);
    rewritten.push_str(new_name);
    rewritten.push_str(&xml[end..]);
    Ok(rewritten)
}

/// Read the manifest entry from an open zip container.
///
/// # Errors
///
/// Returns an `ArchiveError` if the container cannot be read, has no
/// manifest entry, or the manifest does not parse.
pub fn read_manifest<R: Read + Seek>(
    reader: R,
    path: &Path,
) -> Result<SolutionManifest, ArchiveError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| ArchiveError::corrupt(path, e))?;

    let mut entry = match archive.by_name(MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingManifest {
                path: path.display().to_string(),
                entry: MANIFEST_ENTRY.to_string(),
            })
        }
        Err(e) => return Err(ArchiveError::corrupt(path, e)),
    };

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ArchiveError::corrupt(path, e))?;

    parse_manifest(&xml, path)
}
