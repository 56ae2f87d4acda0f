use super::site::SiteProfile;
use super::types::{EventRecord, RawEventRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub events: Vec<EventRecord>,
    /// 欠損フィールドがあり破棄したレコード数
    pub rejected: usize,
}

/// 欠損のあるレコードを除外し、リンクを絶対URLにして連番を振る
///
/// idは採用したレコードだけに0から振るため、常に連続する。
pub fn normalize(raw: Vec<RawEventRecord>, site: &SiteProfile) -> Normalized {
    let mut out = Normalized::default();

    for record in raw {
        if !record.is_complete() {
            out.rejected += 1;
            continue;
        }
        let Some(link) = site.resolve_link(&record.href) else {
            out.rejected += 1;
            continue;
        };

        out.events.push(EventRecord {
            id: out.events.len(),
            title: record.title,
            date: record.date_text,
            link,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, date: &str, href: &str) -> RawEventRecord {
        RawEventRecord {
            title: title.into(),
            date_text: date.into(),
            href: href.into(),
        }
    }

    #[test]
    fn test_drops_incomplete_records() {
        let input = vec![
            raw("A", "Mon", "/a"),
            raw("", "Mon", "/b"),
            raw("C", "", "/c"),
            raw("D", "Tue", ""),
            raw("E", "Wed", "/e"),
        ];

        let out = normalize(input, &SiteProfile::default());

        assert_eq!(out.rejected, 3);
        let titles: Vec<_> = out.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "E"]);
    }

    #[test]
    fn test_ids_are_contiguous_from_zero() {
        let input = vec![
            raw("", "x", "/0"),
            raw("A", "x", "/1"),
            raw("B", "", "/2"),
            raw("C", "x", "/3"),
            raw("D", "x", "/4"),
        ];

        let out = normalize(input, &SiteProfile::default());

        let ids: Vec<_> = out.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_never_drops_complete_records() {
        let input: Vec<_> = (0..25)
            .map(|i| raw(&format!("T{}", i), "Sun", &format!("/event/{}", i)))
            .collect();

        let out = normalize(input, &SiteProfile::default());

        assert_eq!(out.rejected, 0);
        assert_eq!(out.events.len(), 25);
        assert_eq!(out.events[24].id, 24);
    }

    #[test]
    fn test_links_made_absolute() {
        let input = vec![
            raw("Relative", "Fri", "/event/relative"),
            raw("Absolute", "Fri", "https://other.example/event?id=9"),
        ];

        let out = normalize(input, &SiteProfile::default());

        assert_eq!(out.events[0].link, "https://insider.in/event/relative");
        assert_eq!(out.events[1].link, "https://other.example/event?id=9");
        assert_eq!(out.events[0].date, "Fri");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(vec![], &SiteProfile::default()), Normalized::default());
    }
}
