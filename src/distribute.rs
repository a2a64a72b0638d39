//! Distribution of generated media items into marked page elements.
//!
//! The page carries zero or more elements sharing an insertion id, each
//! optionally annotated with a requested item count. The planner walks those
//! elements in document order with a cursor into the item list: a counted
//! element takes `min(count, available)` items (a count of zero means "take
//! everything remaining"), an uncounted element takes a fixed
//! `total / element_count` share, and whatever is left after the last
//! element is dropped.

use std::ops::Range;

use markup5ever_rcdom::Handle;

use crate::error::{QuotepressError, QuotepressResult};
use crate::markup;
use crate::model::MediaItem;

/// Renders one slice of items as an HTML fragment.
///
/// `lead` is true only for the slice that starts at the very beginning of
/// the item list; renderers use it for one-time structure such as a style
/// block.
pub trait FragmentRenderer {
    fn render(&self, items: &[MediaItem], lead: bool) -> String;
}

/// Parse an element's requested count from the configured attribute.
///
/// Absent, non-numeric, or negative values all mean "no requested count".
pub fn requested_count(handle: &Handle, attr: &str) -> Option<usize> {
    markup::get_attribute(handle, attr)?.trim().parse().ok()
}

/// Compute the half-open slice of the item list assigned to each element.
///
/// Slices are contiguous, disjoint, and collectively consume a prefix of
/// `0..total`. The even-split divisor is deliberately the static element
/// count over the original total, so an uncounted element's share does not
/// depend on how much upstream elements consumed.
pub fn plan_slices(counts: &[Option<usize>], total: usize) -> Vec<Range<usize>> {
    let total_elements = counts.len();
    let mut plan = Vec::with_capacity(total_elements);
    let mut start = 0usize;

    for requested in counts {
        if start >= total {
            plan.push(start..start);
            continue;
        }
        let end = match requested {
            Some(k) => {
                let available = total - start;
                let mut take = (*k).min(available);
                if take == 0 {
                    take = available;
                }
                start + take
            }
            None => (start + total / total_elements).min(total),
        };
        plan.push(start..end);
        start = end;
    }

    plan
}

/// Distribute `items` into every element of `html` marked with
/// `insertion_id`, appending a rendered fragment per non-empty slice, and
/// return the updated document.
///
/// Returns [`QuotepressError::MarkerNotFound`] when no element carries the
/// insertion id; the input is left untouched and nothing is rendered.
pub fn distribute(
    html: &str,
    insertion_id: &str,
    items: &[MediaItem],
    count_attribute: &str,
    renderer: &dyn FragmentRenderer,
) -> QuotepressResult<String> {
    let dom = markup::parse_html(html);
    let targets = markup::find_elements_by_id(&dom.document, insertion_id);
    if targets.is_empty() {
        return Err(QuotepressError::MarkerNotFound(insertion_id.to_string()));
    }

    let counts: Vec<Option<usize>> = targets
        .iter()
        .map(|t| requested_count(t, count_attribute))
        .collect();
    let plan = plan_slices(&counts, items.len());

    for (target, range) in targets.iter().zip(&plan) {
        if range.is_empty() {
            continue;
        }
        let lead = range.start == 0;
        let fragment_html = renderer.render(&items[range.clone()], lead);
        let fragment = markup::parse_fragment(&fragment_html);
        markup::append_fragment_children(target, &fragment);
    }

    markup::serialize_html(&dom)
}

/// Default renderer: a flex gallery of `<figure><img></figure>` entries.
pub struct GalleryRenderer;

impl FragmentRenderer for GalleryRenderer {
    fn render(&self, items: &[MediaItem], lead: bool) -> String {
        let mut out = String::new();
        if lead {
            out.push_str(
                "<style>.qp-gallery{display:flex;flex-wrap:wrap;gap:8px}\
                 .qp-gallery img{max-width:100%;height:auto}</style>",
            );
        }
        out.push_str(r#"<div class="qp-gallery">"#);
        for item in items {
            out.push_str(&format!(
                r#"<figure class="qp-item"><img src="{}" alt="{}" loading="lazy"></figure>"#,
                escape_attr(&item.link),
                escape_attr(&item.name),
            ));
        }
        out.push_str("</div>");
        out
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<MediaItem> {
        (0..n)
            .map(|i| MediaItem::new(format!("n{i}"), format!("/wp-content/n{i}.png")))
            .collect()
    }

    struct ListRenderer;

    impl FragmentRenderer for ListRenderer {
        fn render(&self, items: &[MediaItem], lead: bool) -> String {
            let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
            format!(
                r#"<span data-lead="{}" data-names="{}"></span>"#,
                lead,
                names.join(",")
            )
        }
    }

    #[test]
    fn even_split_two_elements() {
        let plan = plan_slices(&[None, None], 6);
        assert_eq!(plan, vec![0..3, 3..6]);
    }

    #[test]
    fn even_split_share_is_floor_of_static_divisor() {
        let plan = plan_slices(&[None, None, None], 7);
        assert_eq!(plan, vec![0..2, 2..4, 4..6]);
        // item 6 is dropped, not redistributed
    }

    #[test]
    fn counted_then_uncounted_uses_original_total() {
        let plan = plan_slices(&[Some(2), None], 6);
        assert_eq!(plan, vec![0..2, 2..5]);
    }

    #[test]
    fn exact_count_when_enough_available() {
        let plan = plan_slices(&[Some(4)], 6);
        assert_eq!(plan, vec![0..4]);
    }

    #[test]
    fn count_clamped_to_available() {
        let plan = plan_slices(&[Some(4), Some(4)], 6);
        assert_eq!(plan, vec![0..4, 4..6]);
    }

    #[test]
    fn zero_count_takes_everything_remaining() {
        let plan = plan_slices(&[Some(2), Some(0)], 6);
        assert_eq!(plan, vec![0..2, 2..6]);
    }

    #[test]
    fn zero_count_alone_takes_all() {
        let plan = plan_slices(&[Some(0)], 6);
        assert_eq!(plan, vec![0..6]);
    }

    #[test]
    fn exhausted_elements_get_empty_slices() {
        let plan = plan_slices(&[Some(6), None, Some(3)], 6);
        assert_eq!(plan, vec![0..6, 6..6, 6..6]);
    }

    #[test]
    fn uncounted_share_clamps_at_total() {
        let plan = plan_slices(&[Some(5), None], 6);
        assert_eq!(plan, vec![0..5, 5..6]);
    }

    #[test]
    fn no_items_means_all_empty() {
        let plan = plan_slices(&[None, Some(3)], 0);
        assert_eq!(plan, vec![0..0, 0..0]);
    }

    #[test]
    fn slices_are_a_disjoint_prefix() {
        let cases: Vec<Vec<Option<usize>>> = vec![
            vec![None; 4],
            vec![Some(0), None, Some(2)],
            vec![Some(3), Some(3), Some(3)],
            vec![None, Some(1), None],
        ];
        for counts in cases {
            let total = 10;
            let plan = plan_slices(&counts, total);
            let mut cursor = 0;
            for range in &plan {
                assert_eq!(range.start, cursor);
                assert!(range.start <= range.end);
                assert!(range.end <= total);
                cursor = range.end;
            }
        }
    }

    #[test]
    fn distributes_across_two_untagged_elements() {
        let html = r#"<div id="spot"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(6), "data-count", &ListRenderer).unwrap();
        assert!(out.contains(r#"data-names="n0,n1,n2""#));
        assert!(out.contains(r#"data-names="n3,n4,n5""#));
    }

    #[test]
    fn honors_count_attribute() {
        let html = r#"<div id="spot" data-count="2"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(6), "data-count", &ListRenderer).unwrap();
        assert!(out.contains(r#"data-names="n0,n1""#));
        assert!(out.contains(r#"data-names="n2,n3,n4""#));
    }

    #[test]
    fn malformed_count_degrades_to_no_count() {
        let html = r#"<div id="spot" data-count="lots"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(6), "data-count", &ListRenderer).unwrap();
        assert!(out.contains(r#"data-names="n0,n1,n2""#));
    }

    #[test]
    fn negative_count_degrades_to_no_count() {
        let html = r#"<div id="spot" data-count="-2"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(6), "data-count", &ListRenderer).unwrap();
        assert!(out.contains(r#"data-names="n0,n1,n2""#));
    }

    #[test]
    fn lead_flag_only_on_first_slice() {
        let html = r#"<div id="spot"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(6), "data-count", &ListRenderer).unwrap();
        assert_eq!(out.matches(r#"data-lead="true""#).count(), 1);
        assert_eq!(out.matches(r#"data-lead="false""#).count(), 1);
    }

    #[test]
    fn missing_marker_is_reported() {
        let html = r#"<div id="other"></div>"#;
        let err = distribute(html, "spot", &items(3), "data-count", &ListRenderer).unwrap_err();
        assert!(matches!(err, QuotepressError::MarkerNotFound(id) if id == "spot"));
    }

    #[test]
    fn exhausted_element_renders_nothing() {
        let html = r#"<div id="spot" data-count="0"></div><div id="spot"></div>"#;
        let out = distribute(html, "spot", &items(4), "data-count", &ListRenderer).unwrap();
        assert_eq!(out.matches("<span").count(), 1);
        assert!(out.contains(r#"data-names="n0,n1,n2,n3""#));
    }

    #[test]
    fn gallery_renderer_emits_style_only_when_lead() {
        let r = GalleryRenderer;
        let lead = r.render(&items(2), true);
        assert!(lead.contains("<style>"));
        assert!(lead.contains(r#"<img src="/wp-content/n0.png""#));

        let rest = r.render(&items(1), false);
        assert!(!rest.contains("<style>"));
    }

    #[test]
    fn gallery_renderer_escapes_attribute_values() {
        let r = GalleryRenderer;
        let item = MediaItem::new("a\"b", "/x?a=1&b=2");
        let out = r.render(std::slice::from_ref(&item), false);
        assert!(out.contains("a&quot;b"));
        assert!(out.contains("/x?a=1&amp;b=2"));
    }
}
