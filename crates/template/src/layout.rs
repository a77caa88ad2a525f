use serde::{Deserialize, Serialize};

use crate::{Section, SectionId, Seconds};

/// Horizontal placement of one section on the timeline strip, in percent of its width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SectionLayout {
    pub section_id: SectionId,
    pub offset_percent: f64,
    pub width_percent: f64,
}

pub fn total_duration(sections: &[Section]) -> Seconds {
    sections.iter().map(|s| s.duration).sum()
}

pub fn section_width_percent(section: &Section, total: Seconds) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    100.0 * section.duration / total
}

pub fn section_layout(sections: &[Section]) -> Vec<SectionLayout> {
    let total = total_duration(sections);
    let mut offset = 0.0;
    sections
        .iter()
        .map(|section| {
            let width = section_width_percent(section, total);
            let layout = SectionLayout {
                section_id: section.id,
                offset_percent: offset,
                width_percent: width,
            };
            offset += width;
            layout
        })
        .collect()
}

/// Index of the section under a click at `fraction` (0..=1) of the timeline width.
///
/// Boundary clicks resolve to the earlier section. Out-of-range fractions are
/// clamped; `None` when the timeline is empty or the fraction is not finite.
pub fn section_at_fraction(sections: &[Section], fraction: f64) -> Option<usize> {
    if !fraction.is_finite() {
        return None;
    }
    let total = total_duration(sections);
    if total <= 0.0 {
        return None;
    }
    first_reaching(sections, fraction.clamp(0.0, 1.0) * total)
}

/// Index of the section playing at `time`, same boundary rule as [`section_at_fraction`].
pub fn section_at_time(sections: &[Section], time: Seconds) -> Option<usize> {
    if !time.is_finite() || time < 0.0 {
        return None;
    }
    first_reaching(sections, time)
}

fn first_reaching(sections: &[Section], target: Seconds) -> Option<usize> {
    let mut cumulative = 0.0;
    for (idx, section) in sections.iter().enumerate() {
        cumulative += section.duration;
        if target <= cumulative {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SectionKind;

    fn sections(durations: &[Seconds]) -> Vec<Section> {
        durations
            .iter()
            .map(|d| Section::new(SectionKind::Body, *d))
            .collect()
    }

    #[test]
    fn test_empty_timeline_has_no_match() {
        assert_eq!(section_at_fraction(&[], 0.5), None);
        assert_eq!(section_at_fraction(&[], 0.0), None);
        assert!(section_layout(&[]).is_empty());
    }

    #[test]
    fn test_boundary_resolves_to_earlier_section() {
        let s = sections(&[5.0, 5.0]);
        assert_eq!(section_at_fraction(&s, 0.5), Some(0));
        assert_eq!(section_at_fraction(&s, 0.51), Some(1));
        assert_eq!(section_at_fraction(&s, 0.0), Some(0));
        assert_eq!(section_at_fraction(&s, 1.0), Some(1));
    }

    #[test]
    fn test_fraction_is_clamped() {
        let s = sections(&[2.0, 3.0, 5.0]);
        assert_eq!(section_at_fraction(&s, -0.2), Some(0));
        assert_eq!(section_at_fraction(&s, 1.3), Some(2));
        assert_eq!(section_at_fraction(&s, f64::NAN), None);
    }

    #[test]
    fn test_uneven_sections() {
        let s = sections(&[2.0, 3.0, 5.0]);
        assert_eq!(section_at_fraction(&s, 0.1), Some(0));
        assert_eq!(section_at_fraction(&s, 0.2), Some(0));
        assert_eq!(section_at_fraction(&s, 0.3), Some(1));
        assert_eq!(section_at_fraction(&s, 0.5), Some(1));
        assert_eq!(section_at_fraction(&s, 0.75), Some(2));
    }

    #[test]
    fn test_section_at_time() {
        let s = sections(&[2.0, 3.0]);
        assert_eq!(section_at_time(&s, 0.0), Some(0));
        assert_eq!(section_at_time(&s, 2.0), Some(0));
        assert_eq!(section_at_time(&s, 2.5), Some(1));
        assert_eq!(section_at_time(&s, 5.5), None);
        assert_eq!(section_at_time(&s, -1.0), None);
    }

    #[test]
    fn test_widths_sum_to_hundred() {
        let s = sections(&[1.0, 2.0, 3.0, 0.7, 11.3]);
        let layout = section_layout(&s);
        let sum: f64 = layout.iter().map(|l| l.width_percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);

        assert_eq!(layout[0].offset_percent, 0.0);
        let last = layout.last().unwrap();
        assert!((last.offset_percent + last.width_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_with_zero_total() {
        let section = Section::new(SectionKind::Intro, 4.0);
        assert_eq!(section_width_percent(&section, 0.0), 0.0);
        assert_eq!(section_width_percent(&section, 8.0), 50.0);
    }
}
