//! # Usage Ledger
//!
//! Append-only history of counter readings.
//!
//! ## Counter Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  IMPADM01 / Toner                                                       │
//! │                                                                         │
//! │  id 1: previous 0     current 1500  → pages 1500                       │
//! │  id 4: previous 1500  current 2300  → pages  800                       │
//! │  id 7: previous 2300  current  100  → pages -2200  (meter reset,       │
//! │                                                     stored verbatim)    │
//! │                                                                         │
//! │  Ids are global across all pairs: 1 + max existing id.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger owns event identity and ordering. Storage order is append
//! order; listing order is chosen per request by [`sort_events`].

use std::cmp::Ordering;

use crate::types::{
    ConsumptionReport, CounterLookup, Page, SortDirection, SortKey, SupplyType, UsageEvent,
};

/// In-memory view of the usage history, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageLedger {
    events: Vec<UsageEvent>,
}

impl UsageLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        UsageLedger::default()
    }

    /// Wraps events already in append order (e.g. loaded `ORDER BY id`).
    pub fn from_events(events: Vec<UsageEvent>) -> Self {
        UsageLedger { events }
    }

    /// Events in append order.
    pub fn events(&self) -> &[UsageEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Id the next appended event will receive.
    pub fn next_id(&self) -> i64 {
        self.events.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }

    /// Counter of the reading that precedes a new one for this pair.
    ///
    /// Returns 0 when the pair has no history. Which matching event counts
    /// as "previous" is decided by `lookup`; ordering is always append
    /// order, never `(date, time)`.
    pub fn find_latest_counter(
        &self,
        printer: &str,
        supply: SupplyType,
        lookup: CounterLookup,
    ) -> i64 {
        let mut matching = self.events.iter().filter(|e| e.matches(printer, supply));
        let found = match lookup {
            CounterLookup::LatestAppended => matching.next_back(),
            CounterLookup::FirstRecorded => matching.next(),
        };
        found.map(|e| e.counter_current).unwrap_or(0)
    }

    /// Builds the event a report would produce, without appending it.
    ///
    /// `model` is the printer's current catalog model; it is frozen into the
    /// event.
    pub fn derive_event(
        &self,
        report: &ConsumptionReport,
        model: &str,
        lookup: CounterLookup,
    ) -> UsageEvent {
        let counter_previous =
            self.find_latest_counter(&report.printer, report.supply, lookup);

        UsageEvent {
            id: self.next_id(),
            printer: report.printer.clone(),
            model: model.to_string(),
            supply: report.supply,
            date: report.date,
            time: report.time,
            user: report.user.clone(),
            counter_current: report.counter_current,
            counter_previous,
            pages_consumed: report.counter_current - counter_previous,
        }
    }

    /// Appends an event, assigning it the next id.
    pub fn append(&mut self, mut event: UsageEvent) -> &UsageEvent {
        event.id = self.next_id();
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// All events ordered for display.
    pub fn list(&self, key: SortKey, direction: SortDirection) -> Vec<UsageEvent> {
        let mut events = self.events.clone();
        sort_events(&mut events, key, direction);
        events
    }
}

// =============================================================================
// Sorting & Pagination
// =============================================================================

/// Stable sort of events for display.
///
/// ## Rules
/// - `Date` compares `(date, time)`
/// - `Desc` keeps equal elements in their original relative order
/// - `Insertion` leaves the slice untouched, whatever the direction
pub fn sort_events(events: &mut [UsageEvent], key: SortKey, direction: SortDirection) {
    let compare: fn(&UsageEvent, &UsageEvent) -> Ordering = match key {
        SortKey::Printer => |a: &UsageEvent, b: &UsageEvent| a.printer.cmp(&b.printer),
        SortKey::Date => |a: &UsageEvent, b: &UsageEvent| (a.date, a.time).cmp(&(b.date, b.time)),
        SortKey::Supply => {
            |a: &UsageEvent, b: &UsageEvent| a.supply.as_str().cmp(b.supply.as_str())
        }
        SortKey::Insertion => return,
    };

    match direction {
        SortDirection::Asc => events.sort_by(compare),
        SortDirection::Desc => events.sort_by(|a, b| compare(b, a)),
    }
}

/// Cuts one page out of an already sorted listing.
///
/// A negative `page_index` is treated as 0; a page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], page_index: i64, page_size: usize) -> Page<T> {
    let page_index = usize::try_from(page_index.max(0)).unwrap_or(usize::MAX);
    let total_count = items.len();

    let slice = page_index
        .checked_mul(page_size)
        .filter(|start| *start < total_count)
        .map(|start| {
            let end = start.saturating_add(page_size).min(total_count);
            items[start..end].to_vec()
        })
        .unwrap_or_default();

    Page {
        items: slice,
        total_count,
        page_index,
        page_size,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn report(printer: &str, supply: SupplyType, counter: i64, day: u32, hour: u32) -> ConsumptionReport {
        ConsumptionReport {
            printer: printer.to_string(),
            supply,
            counter_current: counter,
            user: "Bruno".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        }
    }

    fn record(ledger: &mut UsageLedger, r: ConsumptionReport) -> UsageEvent {
        let event = ledger.derive_event(&r, "Lexmark MX711", CounterLookup::LatestAppended);
        ledger.append(event).clone()
    }

    #[test]
    fn test_first_event_has_zero_previous() {
        let mut ledger = UsageLedger::new();
        let event = record(&mut ledger, report("IMPADM01", SupplyType::Toner, 1500, 1, 9));

        assert_eq!(event.id, 1);
        assert_eq!(event.counter_previous, 0);
        assert_eq!(event.pages_consumed, 1500);
    }

    #[test]
    fn test_counter_chain_per_pair() {
        let mut ledger = UsageLedger::new();
        let readings = [1500, 2300, 2900, 4100];
        let mut events = Vec::new();
        for (i, counter) in readings.iter().enumerate() {
            // interleave another pair to make sure it does not leak in
            record(&mut ledger, report("IMPADM01", SupplyType::Fuser, 10_000 + i as i64, 1, 8));
            events.push(record(&mut ledger, report("IMPADM01", SupplyType::Toner, *counter, 1, 9)));
        }

        assert_eq!(events[0].counter_previous, 0);
        for pair in events.windows(2) {
            assert_eq!(pair[1].counter_previous, pair[0].counter_current);
        }
        for event in ledger.events() {
            assert_eq!(event.pages_consumed, event.counter_current - event.counter_previous);
        }
    }

    #[test]
    fn test_negative_consumption_is_stored_verbatim() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("IMPADM01", SupplyType::Toner, 2300, 1, 9));
        let reset = record(&mut ledger, report("IMPADM01", SupplyType::Toner, 100, 2, 9));

        assert_eq!(reset.counter_previous, 2300);
        assert_eq!(reset.pages_consumed, -2200);
    }

    #[test]
    fn test_lookup_policies() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("IMPADM01", SupplyType::Toner, 1500, 1, 9));
        record(&mut ledger, report("IMPADM01", SupplyType::Toner, 2300, 2, 9));

        assert_eq!(
            ledger.find_latest_counter("IMPADM01", SupplyType::Toner, CounterLookup::LatestAppended),
            2300
        );
        assert_eq!(
            ledger.find_latest_counter("IMPADM01", SupplyType::Toner, CounterLookup::FirstRecorded),
            1500
        );
        assert_eq!(
            ledger.find_latest_counter("IMP_HALL01", SupplyType::Toner, CounterLookup::LatestAppended),
            0
        );
    }

    #[test]
    fn test_lookup_uses_append_order_not_dates() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("IMPADM01", SupplyType::Toner, 2300, 20, 9));
        // back-dated reading appended later still counts as the latest
        record(&mut ledger, report("IMPADM01", SupplyType::Toner, 1800, 3, 9));

        assert_eq!(
            ledger.find_latest_counter("IMPADM01", SupplyType::Toner, CounterLookup::LatestAppended),
            1800
        );
    }

    #[test]
    fn test_next_id_is_one_past_max() {
        let mut ledger = UsageLedger::new();
        let mut event = ledger.derive_event(
            &report("IMPADM01", SupplyType::Toner, 1, 1, 1),
            "Lexmark MX711",
            CounterLookup::LatestAppended,
        );
        event.id = 41;
        let ledger_with_gap = UsageLedger::from_events(vec![event]);
        assert_eq!(ledger_with_gap.next_id(), 42);

        let appended = ledger.append(ledger_with_gap.events()[0].clone()).id;
        assert_eq!(appended, 1);
    }

    #[test]
    fn test_sort_by_date_is_stable() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("B", SupplyType::Toner, 1, 2, 9)); // id 1
        record(&mut ledger, report("A", SupplyType::Toner, 1, 1, 9)); // id 2
        record(&mut ledger, report("C", SupplyType::Toner, 1, 2, 9)); // id 3, ties with id 1
        record(&mut ledger, report("D", SupplyType::Toner, 1, 2, 8)); // id 4

        let asc: Vec<i64> = ledger
            .list(SortKey::Date, SortDirection::Asc)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(asc, vec![2, 4, 1, 3]);

        let desc: Vec<i64> = ledger
            .list(SortKey::Date, SortDirection::Desc)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(desc, vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_sort_by_printer_and_supply() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("IMP_HALL01", SupplyType::Toner, 1, 1, 9));
        record(&mut ledger, report("HP Color", SupplyType::Fuser, 1, 1, 9));
        record(&mut ledger, report("IMPADM01", SupplyType::Photoconductor, 1, 1, 9));

        let printers: Vec<String> = ledger
            .list(SortKey::Printer, SortDirection::Asc)
            .into_iter()
            .map(|e| e.printer)
            .collect();
        assert_eq!(printers, vec!["HP Color", "IMPADM01", "IMP_HALL01"]);

        let supplies: Vec<SupplyType> = ledger
            .list(SortKey::Supply, SortDirection::Desc)
            .into_iter()
            .map(|e| e.supply)
            .collect();
        assert_eq!(
            supplies,
            vec![SupplyType::Toner, SupplyType::Photoconductor, SupplyType::Fuser]
        );
    }

    #[test]
    fn test_insertion_order_ignores_direction() {
        let mut ledger = UsageLedger::new();
        record(&mut ledger, report("B", SupplyType::Toner, 1, 2, 9));
        record(&mut ledger, report("A", SupplyType::Toner, 1, 1, 9));

        let ids: Vec<i64> = ledger
            .list(SortKey::from_query("bogus"), SortDirection::Desc)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_paginate_twelve_by_five() {
        let items: Vec<u32> = (1..=12).collect();

        let first = paginate(&items, 0, 5);
        assert_eq!(first.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(first.total_count, 12);

        assert_eq!(paginate(&items, 2, 5).items, vec![11, 12]);
        assert!(paginate(&items, 3, 5).items.is_empty());
        assert_eq!(paginate(&items, 3, 5).total_count, 12);
    }

    #[test]
    fn test_paginate_clamps_negative_and_huge_index() {
        let items: Vec<u32> = (1..=3).collect();
        let page = paginate(&items, -4, 2);
        assert_eq!(page.page_index, 0);
        assert_eq!(page.items, vec![1, 2]);

        assert!(paginate(&items, i64::MAX, 2).items.is_empty());
    }
}
