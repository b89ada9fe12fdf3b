use crate::document::DocumentParagraph;

/// An interval along the scroll axis, in screen units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f32,
    pub extent: f32,
}

impl Span {
    pub fn new(start: f32, extent: f32) -> Self {
        Self { start, extent }
    }

    pub fn midpoint(&self) -> f32 {
        self.start + self.extent / 2.0
    }
}

/// Estimate the line being read from the viewport and the rendered paragraphs.
///
/// The paragraph whose rendered midpoint is closest to the viewport midpoint is
/// selected (first one wins on ties). The viewport midpoint's fractional position
/// inside that paragraph is then scaled over its line count and clamped to its
/// range. Returns `None` when there are no paragraphs.
pub fn estimate_line<'a, I>(viewport: Span, placed: I) -> Option<usize>
where
    I: IntoIterator<Item = (&'a DocumentParagraph, Span)>,
{
    let target = viewport.midpoint();

    let mut closest: Option<(&DocumentParagraph, Span)> = None;
    let mut closest_distance = f32::INFINITY;
    for (paragraph, span) in placed {
        let distance = (span.midpoint() - target).abs();
        if distance < closest_distance {
            closest_distance = distance;
            closest = Some((paragraph, span));
        }
    }

    let (paragraph, span) = closest?;
    Some(paragraph.start_line + line_offset(paragraph, span, target))
}

fn line_offset(paragraph: &DocumentParagraph, span: Span, target: f32) -> usize {
    let max_offset = paragraph.span();
    if span.extent <= 0.0 {
        return 0;
    }

    let fraction = (target - span.start) / span.extent;
    let offset = (fraction * (max_offset + 1) as f32).floor();
    if offset <= 0.0 {
        0
    } else {
        (offset as usize).min(max_offset)
    }
}
