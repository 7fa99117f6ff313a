//! Result compiler: renders the finished chain into a report.

use std::fmt::Write as _;

use relay_core::hop::CompletedHop;
use relay_core::notify::{RelayReport, ReportLine, ReportPage};

/// Lines per results page.
pub const ENTRIES_PER_PAGE: usize = 10;

/// Compiles `chain` into a paginated report plus a flat text rendering.
/// Returns `None` for an empty chain. Terminal self-loops are shown as is.
#[must_use]
pub fn compile_report(chain: &[CompletedHop]) -> Option<RelayReport> {
    if chain.is_empty() {
        return None;
    }

    let lines: Vec<ReportLine> = chain
        .iter()
        .enumerate()
        .map(|(i, hop)| ReportLine {
            ordinal: i + 1,
            sender: hop.sender.display_name.clone(),
            receiver: hop.receiver.display_name.clone(),
            artifact_ref: hop.artifact.reference.clone(),
            artist: hop.artifact.artist.clone(),
            title: hop.artifact.title.clone(),
        })
        .collect();

    let mut text = String::new();
    for line in &lines {
        // Writing to a String cannot fail.
        let _ = write!(
            text,
            "#{}: {} \u{2794} {}\n{}\nArtist: {}\nTitle: {}\n\n",
            line.ordinal, line.sender, line.receiver, line.artifact_ref, line.artist, line.title
        );
    }

    let pages = lines
        .chunks(ENTRIES_PER_PAGE)
        .enumerate()
        .map(|(i, chunk)| ReportPage {
            number: i + 1,
            lines: chunk.to_vec(),
        })
        .collect();

    Some(RelayReport { pages, text })
}
