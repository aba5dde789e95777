//! Document part traversal.
//!
//! Parts are visited headers first, then the body, then footers. Inside each
//! part, table-cell paragraphs come before the remaining paragraphs, and a
//! paragraph is visited at most once.

use std::collections::HashSet;

use tracing::trace;

use crate::cancel::CancellationToken;
use crate::error::EngineError;
use crate::package::{DocumentPackage, ParagraphId, PartId, PartKind, Section};

/// Counters from one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub parts: usize,
    pub paragraphs: usize,
}

/// Visit every paragraph of `document` in traversal order.
///
/// Cancellation is checked before each part, table cell and paragraph.
pub fn traverse<D, F>(
    document: &mut D,
    cancel: &CancellationToken,
    mut visit: F,
) -> Result<TraversalStats, EngineError>
where
    D: DocumentPackage + ?Sized,
    F: FnMut(&mut D, Section, ParagraphId) -> Result<(), EngineError>,
{
    let mut parts: Vec<(PartKind, PartId)> = document
        .header_parts()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (PartKind::Header(i), id))
        .collect();
    parts.push((PartKind::Body, document.body_part()));
    parts.extend(
        document
            .footer_parts()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (PartKind::Footer(i), id)),
    );

    let mut stats = TraversalStats::default();
    for (kind, part) in parts {
        cancel.check()?;
        stats.paragraphs += visit_part(document, kind, part, cancel, &mut visit)?;
        stats.parts += 1;
    }
    Ok(stats)
}

fn visit_part<D, F>(
    document: &mut D,
    kind: PartKind,
    part: PartId,
    cancel: &CancellationToken,
    visit: &mut F,
) -> Result<usize, EngineError>
where
    D: DocumentPackage + ?Sized,
    F: FnMut(&mut D, Section, ParagraphId) -> Result<(), EngineError>,
{
    let mut visited = HashSet::new();

    let table = Section {
        part: kind,
        in_table: true,
    };
    for cell in document.table_cells(part) {
        cancel.check()?;
        for paragraph in cell {
            if visited.insert(paragraph) {
                cancel.check()?;
                visit(document, table, paragraph)?;
            }
        }
    }

    let section = Section {
        part: kind,
        in_table: false,
    };
    for paragraph in document.paragraphs(part) {
        if visited.insert(paragraph) {
            cancel.check()?;
            visit(document, section, paragraph)?;
        }
    }

    trace!(section = %section, paragraphs = visited.len(), "Visited part");
    Ok(visited.len())
}
