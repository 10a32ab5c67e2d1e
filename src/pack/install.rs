//! Figure installation, on-disk renaming, and bibliography handling.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::tex::{find_bibliography_command, has_inline_bibliography, splice_bibliography};
use crate::tool::ImageConverter;
use crate::util::decode_text;

use super::plan::PlannedFigure;
use super::{ArtifactKind, BuildArtifact, PackStyle};

/// Copy one figure into the output directory under its planned name,
/// converting it to JPEG when the plan says it exceeds the size cap.
///
/// Copying straight to the final name keeps two source figures that
/// share a stem (`fig1.pdf` and `other/fig1.pdf`) from colliding in the
/// flat build directory: their planned stems are already distinct.
///
/// The converted file replaces the copy, and must itself come in under
/// the cap or the whole run fails: a bundle that cannot meet the limit
/// is not worth uploading.
pub(crate) fn install(
    figure: &PlannedFigure,
    build_dir: &Path,
    size_cap: Option<u64>,
    converter: &dyn ImageConverter,
) -> Result<BuildArtifact> {
    let copied_name = format!("{}.{}", figure.final_stem, figure.resolved.ext);
    let copied = build_dir.join(&copied_name);
    fs::copy(&figure.resolved.path, &copied)?;

    if !figure.transcode {
        return Ok(BuildArtifact {
            source: Some(figure.resolved.path.clone()),
            dest: copied_name.into(),
            size: figure.resolved.size,
            kind: ArtifactKind::Figure,
        });
    }

    let jpeg_name = format!("{}.{}", figure.final_stem, figure.final_ext);
    let jpeg = build_dir.join(&jpeg_name);
    converter.to_jpeg(&copied, &jpeg)?;
    if jpeg != copied {
        fs::remove_file(&copied)?;
    }

    let size = fs::metadata(&jpeg)?.len();
    if let Some(cap) = size_cap {
        if size > cap {
            return Err(Error::SizeLimitExceeded {
                figure: jpeg,
                actual: size,
                limit: cap,
            });
        }
    }
    debug!(figure = %figure.resolved.base, size, "transcoded oversized figure");

    Ok(BuildArtifact {
        source: Some(figure.resolved.path.clone()),
        dest: jpeg_name.into(),
        size,
        kind: ArtifactKind::TranscodedFigure,
    })
}

/// Deal with the bibliography according to the style.
///
/// A manuscript that already embeds `thebibliography` needs nothing. A
/// `\bibliography{...}` command requires the compiled `.bbl` next to
/// the master document: aastex copies it into the bundle, arxiv splices
/// its text over the command. A stray `.bbl` without any bibliography
/// command is copied (aastex) or spliced in before `\end{document}`
/// (arxiv). Returns the artifact for a copied `.bbl`.
pub(crate) fn handle_bibliography(
    text: &mut String,
    style: PackStyle,
    bbl: &Path,
    build_dir: &Path,
) -> Result<Option<BuildArtifact>> {
    if has_inline_bibliography(text) {
        debug!("bibliography already inline");
        return Ok(None);
    }

    let has_command = find_bibliography_command(text).is_some();
    if !bbl.is_file() {
        if has_command {
            return Err(Error::BibliographyUnavailable {
                expected: bbl.to_path_buf(),
            });
        }
        return Ok(None);
    }

    if style == PackStyle::Arxiv {
        let bbl_text = decode_text(&fs::read(bbl)?).into_owned();
        if let Some(spliced) = splice_bibliography(text, &bbl_text) {
            debug!(bbl = %bbl.display(), "spliced bibliography into manuscript");
            *text = spliced;
            return Ok(None);
        }
        // nowhere to splice it; fall through and copy instead
    }

    let name = bbl
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ms.bbl".to_string());
    let dest = build_dir.join(&name);
    fs::copy(bbl, &dest)?;
    let size = fs::metadata(&dest)?.len();
    debug!(bbl = %name, "copied bibliography");

    Ok(Some(BuildArtifact {
        source: Some(bbl.to_path_buf()),
        dest: name.into(),
        size,
        kind: ArtifactKind::Bibliography,
    }))
}
