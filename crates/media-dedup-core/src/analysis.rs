use crate::catalog::CatalogFetcher;
use crate::duplicates::{duplicate_group_count, DuplicateEngine};
use crate::error::RetrievalError;
use crate::names::UserNameCache;
use crate::play_state::{PlayStateAggregator, SeenSets};
use crate::reconcile::reconcile;
use chrono::{DateTime, Utc};
use media_dedup_models::{DuplicateVerdict, UserRecord};
use media_dedup_sources::MediaServer;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Outcome of one full analysis pass
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub movie_count: usize,
    pub user_count: usize,
    pub duplicate_group_count: usize,
    pub verdicts: Vec<DuplicateVerdict>,
}

impl AnalysisReport {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Pairs whose paths are similar enough to be the same file
    pub fn potential_duplicates(&self) -> impl Iterator<Item = &DuplicateVerdict> {
        self.verdicts.iter().filter(|v| v.is_duplicate)
    }

    /// Same name and year, but the paths point at different files
    pub fn potential_mismatches(&self) -> impl Iterator<Item = &DuplicateVerdict> {
        self.verdicts.iter().filter(|v| !v.is_duplicate)
    }

    pub fn discrepancy_count(&self) -> usize {
        self.verdicts.iter().map(|v| v.discrepancies.len()).sum()
    }
}

/// Runs catalog retrieval, play-state aggregation, reconciliation and
/// duplicate detection end to end
pub struct Analyzer {
    catalog: CatalogFetcher,
    play_states: PlayStateAggregator,
}

impl Analyzer {
    pub fn new(server: Arc<dyn MediaServer>, account_id: impl Into<String>, names: Arc<UserNameCache>) -> Self {
        Self {
            catalog: CatalogFetcher::new(server.clone(), account_id),
            play_states: PlayStateAggregator::new(server, names),
        }
    }

    /// Build from pre-configured fetchers
    pub fn from_parts(catalog: CatalogFetcher, play_states: PlayStateAggregator) -> Self {
        Self { catalog, play_states }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<AnalysisReport, RetrievalError> {
        let started_at = Utc::now();
        let start = Instant::now();

        // The catalog and the user fan-out only meet at reconciliation
        let (movies, (users, seen)) = futures::try_join!(
            self.catalog.fetch_all_movies(),
            self.fetch_users_and_play_states(),
        )?;

        let movies = reconcile(movies, &seen, &users);
        info!("Reconciled {} movies against {} users", movies.len(), users.len());

        let verdicts = DuplicateEngine::new(&users).find_duplicates(&movies);
        let duplicate_group_count = duplicate_group_count(&movies);
        info!(
            "Found {} candidate pairs in {} duplicate groups",
            verdicts.len(),
            duplicate_group_count
        );

        Ok(AnalysisReport {
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            movie_count: movies.len(),
            user_count: users.len(),
            duplicate_group_count,
            verdicts,
        })
    }

    async fn fetch_users_and_play_states(&self) -> Result<(Vec<UserRecord>, SeenSets), RetrievalError> {
        let users = self.play_states.fetch_users().await?;
        let seen = self.play_states.fetch_play_states(&users).await?;
        Ok((users, seen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie, FakeServer, ACCOUNT};
    use media_dedup_models::MovieRecord;
    use std::collections::HashSet;
    use std::time::Duration;

    fn analyzer(server: Arc<FakeServer>) -> Analyzer {
        let names = Arc::new(UserNameCache::new(server.clone()));
        Analyzer::new(server, ACCOUNT, names)
    }

    fn inception_server(u2_played: &[&str]) -> FakeServer {
        FakeServer::new()
            .with_library("movies", vec![MovieRecord::new("m", "Inception", 2010, "/m/inception.mkv")])
            .with_library("backup", vec![MovieRecord::new("b", "Inception", 2010, "/b/inception.mkv")])
            .with_user("u1", "Alice", &["m", "b"])
            .with_user("u2", "Bob", u2_played)
    }

    #[tokio::test]
    async fn test_both_users_played_both_copies() {
        let report = analyzer(Arc::new(inception_server(&["m", "b"]))).run().await.unwrap();

        assert_eq!(report.movie_count, 2);
        assert_eq!(report.user_count, 2);
        assert_eq!(report.duplicate_group_count, 1);
        assert_eq!(report.verdicts.len(), 1);

        let verdict = &report.verdicts[0];
        assert!(verdict.involves("m", "b"));
        // one differing code point over "/m/inception": 100 - floor(100 / 12)
        assert_eq!(verdict.similarity, 92);
        assert!(verdict.has_identical_play_status);
        assert!(verdict.discrepancies.is_empty());
        assert_eq!(report.discrepancy_count(), 0);
    }

    #[tokio::test]
    async fn test_same_file_on_two_mounts_is_a_duplicate() {
        let server = FakeServer::new()
            .with_library("movies", vec![MovieRecord::new(
                "m",
                "Inception",
                2010,
                "/media/movies/Inception (2010)/Inception (2010) - 1080p.mkv",
            )])
            .with_library("backup", vec![MovieRecord::new(
                "b",
                "Inception",
                2010,
                "/media/movies/Inception (2010)/Inception (2010) - 1080p.mp4",
            )])
            .with_user("u1", "Alice", &["m", "b"])
            .with_user("u2", "Bob", &["m", "b"]);
        let report = analyzer(Arc::new(server)).run().await.unwrap();

        let verdict = &report.verdicts[0];
        assert!(verdict.similarity >= 95);
        assert!(verdict.is_duplicate);
        assert!(verdict.has_identical_play_status);
        assert!(verdict.discrepancies.is_empty());
        assert_eq!(report.potential_duplicates().count(), 1);
        assert_eq!(report.potential_mismatches().count(), 0);
    }

    #[tokio::test]
    async fn test_one_user_missing_a_copy() {
        let report = analyzer(Arc::new(inception_server(&["b"]))).run().await.unwrap();

        let verdict = &report.verdicts[0];
        assert!(!verdict.has_identical_play_status);
        assert_eq!(verdict.discrepancies.len(), 1);
        let discrepancy = &verdict.discrepancies[0];
        assert_eq!(discrepancy.user_id, "u2");
        assert_eq!(discrepancy.user_name, "Bob");
        assert_eq!(discrepancy.movie_to_update, "m");
        assert_eq!(discrepancy.movie_name, "Inception");
    }

    #[tokio::test]
    async fn test_remakes_are_never_compared() {
        let server = FakeServer::new()
            .with_library("a", vec![
                MovieRecord::new("kk33", "King Kong", 1933, "/movies/King Kong.mkv"),
                MovieRecord::new("kk05", "King Kong", 2005, "/movies/King Kong.mkv"),
            ])
            .with_user("u1", "Alice", &["kk33"]);
        let report = analyzer(Arc::new(server)).run().await.unwrap();

        assert!(report.verdicts.is_empty());
        assert_eq!(report.duplicate_group_count, 0);
    }

    #[tokio::test]
    async fn test_one_failing_library_fails_the_run() {
        let server = FakeServer::new()
            .with_library("a", vec![movie("a1", "Heat", 1995), movie("a2", "Heat", 1995)])
            .with_library("b", vec![movie("b1", "Ran", 1985)])
            .with_library("c", vec![movie("c1", "Alien", 1979)])
            .with_user("u1", "Alice", &[])
            .failing_library("b");

        let result = analyzer(Arc::new(server)).run().await;
        assert!(matches!(result, Err(RetrievalError::Library { ref library_id, .. }) if library_id == "b"));
    }

    #[tokio::test]
    async fn test_failing_user_fails_the_run() {
        let server = FakeServer::new()
            .with_library("a", vec![movie("a1", "Heat", 1995)])
            .with_user("u1", "Alice", &[])
            .failing_user("u1");

        let result = analyzer(Arc::new(server)).run().await;
        assert!(matches!(result, Err(RetrievalError::PlayedItems { .. })));
    }

    #[tokio::test]
    async fn test_copy_listed_in_two_libraries_is_not_its_own_duplicate() {
        let shared = movie("m1", "Heat", 1995);
        let server = FakeServer::new()
            .with_library("a", vec![shared.clone()])
            .with_library("b", vec![shared, movie("m2", "Heat", 1995)])
            .with_user("u1", "Alice", &["m1"]);
        let report = analyzer(Arc::new(server)).run().await.unwrap();

        assert_eq!(report.movie_count, 2);
        assert_eq!(report.verdicts.len(), 1);
        assert!(report.verdicts[0].involves("m1", "m2"));
    }

    #[tokio::test]
    async fn test_mixed_catalog_classification() {
        let server = FakeServer::new()
            .with_library("a", vec![
                MovieRecord::new("h1", "Heat", 1995, "/media/movies/Heat (1995)/Heat (1995).mkv"),
                MovieRecord::new("h2", "Heat", 1995, "/media/movies/Heat (1995)/Heat (1995).avi"),
                MovieRecord::new("h3", "Heat", 1995, "/other/heat-directors-cut.mkv"),
                movie("r1", "Ran", 1985),
            ])
            .with_user("u1", "Alice", &["h1"])
            .with_user("u2", "Bob", &[]);
        let report = analyzer(Arc::new(server)).run().await.unwrap();

        assert_eq!(report.verdicts.len(), 3);
        let duplicates: HashSet<(String, String)> = report
            .potential_duplicates()
            .map(|v| (v.movie_a.id.clone(), v.movie_b.id.clone()))
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert!(report.potential_duplicates().all(|v| v.involves("h1", "h2")));
        assert_eq!(report.potential_mismatches().count(), 2);
        // u1 played h1 only, so both pairs with h1 report one discrepancy
        assert_eq!(report.discrepancy_count(), 2);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let report = analyzer(Arc::new(inception_server(&["b"]))).run().await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["movie_count"], 2);
        assert_eq!(json["verdicts"][0]["discrepancies"][0]["user_id"], "u2");
    }

    #[tokio::test]
    async fn test_safe_pair_keeps_empty_discrepancies() {
        let report = analyzer(Arc::new(inception_server(&["m", "b"]))).run().await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdicts"][0]["has_identical_play_status"], true);
        assert_eq!(json["verdicts"][0]["discrepancies"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_catalog_and_play_state_fetches_overlap() {
        let mut server = FakeServer::new().with_latency(Duration::from_millis(20));
        for i in 0..3 {
            server = server
                .with_library(&format!("lib{}", i), vec![movie(&format!("m{}", i), "Alien", 1979)])
                .with_user(&format!("u{}", i), &format!("User {}", i), &[]);
        }
        let server = Arc::new(server);
        let names = Arc::new(UserNameCache::new(server.clone()));

        // One fetch at a time per pool, so any overlap comes from running the pools together
        let analyzer = Analyzer::from_parts(
            CatalogFetcher::new(server.clone(), ACCOUNT).with_max_concurrent(1),
            PlayStateAggregator::new(server.clone(), names).with_max_concurrent(1),
        );
        let report = analyzer.run().await.unwrap();

        assert_eq!(report.movie_count, 3);
        assert_eq!(report.user_count, 3);
        assert_eq!(server.library_fetches.max(), 1);
        assert_eq!(server.user_fetches.max(), 1);
        assert_eq!(server.fetches.max(), 2, "library and user fetches ran one after the other");
    }
}
