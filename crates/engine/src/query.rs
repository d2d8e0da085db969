//! Read-side helpers over a fetched list of leads: search, pagination, and
//! the dashboard counters.

use serde::Serialize;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::timestamp;
use crate::types::Lead;

/// Default rows per page for lead tables.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Case-insensitive substring match over the contact fields.
///
/// A blank query matches everything.
pub fn search<'a>(leads: &'a [Lead], query: &str) -> Vec<&'a Lead> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return leads.iter().collect();
    }
    leads
        .iter()
        .filter(|lead| haystack(lead).contains(&needle))
        .collect()
}

fn haystack(lead: &Lead) -> String {
    [
        lead.name.as_str(),
        lead.email.as_str(),
        lead.phone.as_deref().unwrap_or(""),
        lead.company.as_str(),
        lead.service.as_str(),
        lead.description.as_deref().unwrap_or(""),
    ]
    .join(" ")
    .to_lowercase()
}

/// One page of a result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Slice `items` into the 1-based `page` of `per_page` rows.
///
/// Page 0 is read as page 1 and a zero page size as [`DEFAULT_PAGE_SIZE`].
/// A page past the end is served empty with the real totals.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = if per_page == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        per_page
    };
    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

/// Counters shown on the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Created in the same calendar month (UTC) as `now`.
    pub this_month: usize,
    /// Created since the start of the current week (Sunday 00:00 UTC).
    pub this_week: usize,
}

/// Counts over non-archived leads. Leads with an unparseable `created_at`
/// count toward the total only.
pub fn dashboard_stats(leads: &[Lead], now: OffsetDateTime) -> DashboardStats {
    let now = now.to_offset(UtcOffset::UTC);
    let days_into_week = i64::from(now.date().weekday().number_days_from_sunday());
    let week_start = now
        .date()
        .saturating_sub(Duration::days(days_into_week))
        .midnight()
        .assume_utc();

    let mut stats = DashboardStats {
        total: 0,
        this_month: 0,
        this_week: 0,
    };
    for lead in leads.iter().filter(|l| !l.archived) {
        stats.total += 1;
        let Some(created) = timestamp::parse(&lead.created_at) else {
            continue;
        };
        let created = created.to_offset(UtcOffset::UTC);
        if created.year() == now.year() && created.month() == now.month() {
            stats.this_month += 1;
        }
        if created >= week_start {
            stats.this_week += 1;
        }
    }
    stats
}

/// Whole days since the lead was created; None if `created_at` is unparseable.
pub fn lead_age_days(lead: &Lead, now: OffsetDateTime) -> Option<i64> {
    timestamp::parse(&lead.created_at).map(|created| (now - created).whole_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use time::macros::datetime;

    fn lead(id: &str, created_at: &str) -> Lead {
        Lead {
            id: id.to_string(),
            name: format!("Name {}", id),
            email: format!("{}@example.com", id),
            phone: None,
            company: "Globex".to_string(),
            company_domain: None,
            service: "Hosting".to_string(),
            description: None,
            source: None,
            created_at: created_at.to_string(),
            status: Stage::New,
            owner_id: None,
            archived: false,
            expected_value: None,
            probability: None,
            last_activity: None,
        }
    }

    #[test]
    fn search_matches_any_contact_field_case_insensitively() {
        let mut a = lead("a", "2026-01-01T00:00:00Z");
        a.description = Some("Wants a CRM migration".to_string());
        let mut b = lead("b", "2026-01-01T00:00:00Z");
        b.phone = Some("+44 20 7946 0000".to_string());
        b.company = "Initech".to_string();
        let leads = vec![a, b];

        let ids = |q: &str| -> Vec<String> { search(&leads, q).iter().map(|l| l.id.clone()).collect() };
        assert_eq!(ids("crm"), ["a"]);
        assert_eq!(ids("  INITECH "), ["b"]);
        assert_eq!(ids("7946"), ["b"]);
        assert_eq!(ids("hosting"), ["a", "b"]);
        assert_eq!(ids(""), ["a", "b"]);
        assert!(ids("nothing-like-this").is_empty());
    }

    #[test]
    fn paginate_slices_and_counts() {
        let page = paginate((1..=23).collect::<Vec<u32>>(), 3, 10);
        assert_eq!(page.items, [21, 22, 23]);
        assert_eq!(page.total, 23);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn paginate_clamps_page_and_size() {
        let page = paginate(vec![1, 2, 3], 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, DEFAULT_PAGE_SIZE);
        assert_eq!(page.items, [1, 2, 3]);

        let past_end = paginate(vec![1, 2, 3], 9, 2);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 2);

        let empty = paginate(Vec::<u8>::new(), 1, 5);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn dashboard_buckets_by_month_and_week() {
        // Wednesday 2026-04-15; the week started Sunday 2026-04-12.
        let now = datetime!(2026-04-15 12:00:00 UTC);
        let mut archived = lead("archived", "2026-04-14T00:00:00Z");
        archived.archived = true;
        let leads = vec![
            lead("this-week", "2026-04-13T09:00:00Z"),
            lead("sunday-midnight", "2026-04-12T00:00:00Z"),
            lead("saturday", "2026-04-11T23:59:59Z"),
            lead("last-month", "2026-03-31T10:00:00Z"),
            lead("last-year", "2025-04-15T10:00:00Z"),
            lead("garbage", "not a date"),
            archived,
        ];
        let stats = dashboard_stats(&leads, now);
        assert_eq!(
            stats,
            DashboardStats {
                total: 6,
                this_month: 3,
                this_week: 2,
            }
        );
    }

    #[test]
    fn week_starting_on_sunday_includes_today() {
        let now = datetime!(2026-04-12 08:00:00 UTC);
        let leads = vec![
            lead("today", "2026-04-12T01:00:00Z"),
            lead("yesterday", "2026-04-11T20:00:00Z"),
        ];
        assert_eq!(dashboard_stats(&leads, now).this_week, 1);
    }

    #[test]
    fn age_in_whole_days() {
        let l = lead("a", "2026-04-01T12:00:00Z");
        assert_eq!(lead_age_days(&l, datetime!(2026-04-03 11:59:59 UTC)), Some(1));
        assert_eq!(lead_age_days(&l, datetime!(2026-04-03 12:00:00 UTC)), Some(2));
        assert_eq!(lead_age_days(&lead("b", "??"), datetime!(2026-04-03 12:00:00 UTC)), None);
    }
}
