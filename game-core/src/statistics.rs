use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;
use game_types::{
    DailySummary, Difficulty, HistoryEntry, HistoryFilter, HistoryItem, HistoryPage,
    HistoryQuery, HistorySortField, MAX_ATTEMPTS, MonthlyStats, SortOrder, UserStats,
};

/// Letters that do not make a word harder to guess
pub const COMMON_LETTERS: &str = "AEIOSRNLTDCU";

/// Derives every statistic from the raw history log. Entries may be passed in
/// any order; anything order-sensitive sorts by completion time first.
pub struct StatsEngine;

impl StatsEngine {
    pub fn user_stats(entries: &[HistoryEntry]) -> UserStats {
        let chronological = Self::chronological(entries);
        let totals = Totals::from_entries(entries);

        UserStats {
            total_games: totals.games,
            wins: totals.wins,
            losses: totals.games - totals.wins,
            win_percentage: totals.win_percentage(),
            current_streak: Self::current_streak_sorted(&chronological),
            max_streak: Self::max_streak_sorted(&chronological),
            attempt_distribution: totals.distribution.clone(),
            average_attempts: totals.average_attempts(),
        }
    }

    /// Wins counted back from the most recent game until the first loss
    pub fn current_streak(entries: &[HistoryEntry]) -> u32 {
        Self::current_streak_sorted(&Self::chronological(entries))
    }

    pub fn max_streak(entries: &[HistoryEntry]) -> u32 {
        Self::max_streak_sorted(&Self::chronological(entries))
    }

    fn current_streak_sorted(chronological: &[&HistoryEntry]) -> u32 {
        chronological
            .iter()
            .rev()
            .take_while(|entry| entry.is_won)
            .count() as u32
    }

    fn max_streak_sorted(chronological: &[&HistoryEntry]) -> u32 {
        let mut max_streak = 0;
        let mut streak = 0;

        for entry in chronological {
            if entry.is_won {
                streak += 1;
                max_streak = max_streak.max(streak);
            } else {
                streak = 0;
            }
        }

        max_streak
    }

    fn chronological(entries: &[HistoryEntry]) -> Vec<&HistoryEntry> {
        let mut sorted: Vec<&HistoryEntry> = entries.iter().collect();
        sorted.sort_by_key(|entry| entry.completed_at);
        sorted
    }

    /// `60 - 10 * attempts` for a win, floored at 0; losses score 0
    pub fn score(entry: &HistoryEntry) -> u32 {
        if entry.is_won {
            60u32.saturating_sub(10 * entry.attempts_used)
        } else {
            0
        }
    }

    pub fn duration_minutes(entry: &HistoryEntry) -> i64 {
        (entry.completed_at - entry.game_started_at).num_minutes()
    }

    pub fn difficulty(word: &str) -> Difficulty {
        let word = word.to_uppercase();

        let mut seen = HashSet::new();
        let has_repeat = word.chars().any(|ch| !seen.insert(ch));
        let uncommon = word.chars().filter(|&ch| !COMMON_LETTERS.contains(ch)).count();

        if has_repeat || uncommon >= 3 {
            Difficulty::Hard
        } else if uncommon >= 1 {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        }
    }

    pub fn history_item(entry: &HistoryEntry) -> HistoryItem {
        HistoryItem {
            entry: entry.clone(),
            duration_minutes: Self::duration_minutes(entry),
            score: Self::score(entry),
            difficulty: Self::difficulty(&entry.target_word),
        }
    }

    pub fn history_page(entries: &[HistoryEntry], query: &HistoryQuery) -> HistoryPage {
        let filtered: Vec<HistoryEntry> = entries
            .iter()
            .filter(|entry| match query.filter {
                HistoryFilter::All => true,
                HistoryFilter::Won => entry.is_won,
                HistoryFilter::Lost => !entry.is_won,
            })
            .filter(|entry| query.date_from.is_none_or(|from| entry.completed_at >= from))
            .filter(|entry| query.date_to.is_none_or(|to| entry.completed_at <= to))
            .cloned()
            .collect();

        let mut items: Vec<HistoryItem> = filtered.iter().map(Self::history_item).collect();
        items.sort_by(|a, b| {
            let ordering = Self::compare_items(a, b, query.sort_by);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = items.len();
        let limit = query.limit.min(HistoryQuery::MAX_LIMIT);
        let games: Vec<HistoryItem> = items.into_iter().skip(query.offset).take(limit).collect();

        HistoryPage {
            has_more: query.offset + games.len() < total,
            games,
            total,
            limit,
            offset: query.offset,
            summary: Self::user_stats(&filtered),
        }
    }

    fn compare_items(a: &HistoryItem, b: &HistoryItem, field: HistorySortField) -> Ordering {
        let primary = match field {
            HistorySortField::CompletedAt => Ordering::Equal,
            HistorySortField::AttemptsUsed => a.entry.attempts_used.cmp(&b.entry.attempts_used),
            HistorySortField::Duration => a.duration_minutes.cmp(&b.duration_minutes),
            HistorySortField::Score => a.score.cmp(&b.score),
        };

        primary.then_with(|| a.entry.completed_at.cmp(&b.entry.completed_at))
    }

    pub fn monthly_stats(entries: &[HistoryEntry], year: i32, month: u32) -> MonthlyStats {
        let in_month: Vec<HistoryEntry> = entries
            .iter()
            .filter(|entry| entry.completed_at.year() == year && entry.completed_at.month() == month)
            .cloned()
            .collect();

        let totals = Totals::from_entries(&in_month);

        let mut by_day: BTreeMap<u32, DailySummary> = BTreeMap::new();
        for entry in &in_month {
            let day = entry.completed_at.day();
            let summary = by_day.entry(day).or_insert(DailySummary {
                day,
                games: 0,
                wins: 0,
            });
            summary.games += 1;
            if entry.is_won {
                summary.wins += 1;
            }
        }

        MonthlyStats {
            year,
            month,
            total_games: totals.games,
            wins: totals.wins,
            losses: totals.games - totals.wins,
            win_percentage: totals.win_percentage(),
            average_attempts: totals.average_attempts(),
            attempt_distribution: totals.distribution.clone(),
            max_streak: Self::max_streak(&in_month),
            daily: by_day.into_values().collect(),
        }
    }
}

struct Totals {
    games: u32,
    wins: u32,
    distribution: Vec<u32>,
}

impl Totals {
    fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut distribution = vec![0; MAX_ATTEMPTS as usize];
        let mut wins = 0;

        for entry in entries.iter().filter(|entry| entry.is_won) {
            wins += 1;
            if (1..=MAX_ATTEMPTS).contains(&entry.attempts_used) {
                distribution[(entry.attempts_used - 1) as usize] += 1;
            }
        }

        Self {
            games: entries.len() as u32,
            wins,
            distribution,
        }
    }

    fn win_percentage(&self) -> u32 {
        if self.games == 0 {
            return 0;
        }
        (f64::from(self.wins) / f64::from(self.games) * 100.0).round() as u32
    }

    /// Mean attempts over won games, one decimal place
    fn average_attempts(&self) -> f64 {
        if self.wins == 0 {
            return 0.0;
        }

        let weighted: u32 = self
            .distribution
            .iter()
            .enumerate()
            .map(|(index, count)| count * (index as u32 + 1))
            .sum();

        (f64::from(weighted) / f64::from(self.wins) * 10.0).round() / 10.0
    }
}
