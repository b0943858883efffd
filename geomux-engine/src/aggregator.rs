//! Provider fan-out under the four selection policies
//!
//! | Mode       | Selection                 | Waits for        | Total failure            |
//! |------------|---------------------------|------------------|--------------------------|
//! | race_best  | minimal priority only     | first success    | `NoProvidersSucceeded`   |
//! | all        | every provider            | every provider   | empty list, not an error |
//! | grouped    | priority in caller's set  | every provider   | empty map                |
//! | by_name    | one named provider        | that provider    | its own error            |
//!
//! Individual provider failures inside the fan-out modes are logged and
//! dropped (per-provider error isolation). Results are kept in completion
//! order, never configuration order.

use crate::providers::ProviderCatalog;
use crate::types::{
    AggregationOutcome, GeocodeError, GeocodeMode, GeocodeResponse, GeocodingProvider,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Providers whose priority equals the minimum over `providers`
///
/// Non-empty whenever `providers` is non-empty.
pub fn select_best_priority(
    providers: &[Arc<dyn GeocodingProvider>],
) -> Vec<Arc<dyn GeocodingProvider>> {
    let Some(best) = providers.iter().map(|p| p.priority()).min() else {
        return Vec::new();
    };

    providers
        .iter()
        .filter(|p| p.priority() == best)
        .cloned()
        .collect()
}

/// Providers whose priority is in `priorities`
pub fn select_priorities(
    providers: &[Arc<dyn GeocodingProvider>],
    priorities: &BTreeSet<i32>,
) -> Vec<Arc<dyn GeocodingProvider>> {
    providers
        .iter()
        .filter(|p| priorities.contains(&p.priority()))
        .cloned()
        .collect()
}

/// Non-empty address after trimming, else `Validation`
pub fn validate_address(address: &str) -> Result<&str, GeocodeError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(GeocodeError::Validation("Address is required".to_string()));
    }
    Ok(trimmed)
}

/// Fan-out executor over the providers of a catalog
#[derive(Clone)]
pub struct Aggregator {
    catalog: Arc<dyn ProviderCatalog>,
}

impl Aggregator {
    pub fn new(catalog: Arc<dyn ProviderCatalog>) -> Self {
        Self { catalog }
    }

    /// Dispatch on `mode`
    pub async fn run(
        &self,
        mode: &GeocodeMode,
        address: &str,
    ) -> Result<AggregationOutcome, GeocodeError> {
        match mode {
            GeocodeMode::First => self.race_best(address).await.map(AggregationOutcome::Single),
            GeocodeMode::All => self.all(address).await.map(AggregationOutcome::Union),
            GeocodeMode::Group(priorities) => self
                .grouped(address, priorities)
                .await
                .map(AggregationOutcome::Grouped),
            GeocodeMode::Provider(name) => self
                .by_name(address, name)
                .await
                .map(AggregationOutcome::Single),
        }
    }

    /// First successful response among the best-priority providers
    ///
    /// Siblings still in flight when a winner arrives are dropped.
    pub async fn race_best(&self, address: &str) -> Result<GeocodeResponse, GeocodeError> {
        let address = validate_address(address)?;
        let providers = self.catalog.providers().await?;
        let candidates = select_best_priority(&providers);

        debug!(
            address,
            configured = providers.len(),
            candidates = candidates.len(),
            "Racing best-priority providers"
        );

        let mut in_flight: FuturesUnordered<_> = candidates
            .into_iter()
            .map(|provider| async move {
                let result = provider.geocode(address).await;
                (provider, result)
            })
            .collect();

        while let Some((provider, result)) = in_flight.next().await {
            match result {
                Ok(response) => {
                    info!(
                        provider = %provider.name(),
                        priority = provider.priority(),
                        abandoned = in_flight.len(),
                        "Race won"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!(provider = %provider.name(), error = %e, "Provider failed in race");
                }
            }
        }

        warn!(address, "No best-priority provider succeeded");
        Err(GeocodeError::NoProvidersSucceeded(address.to_string()))
    }

    /// Every provider's successful response, in completion order
    ///
    /// Total failure yields an empty list, not an error.
    pub async fn all(&self, address: &str) -> Result<Vec<GeocodeResponse>, GeocodeError> {
        let address = validate_address(address)?;
        let providers = self.catalog.providers().await?;
        let total = providers.len();

        let responses: Vec<GeocodeResponse> = fan_out(providers, address)
            .filter_map(|(_, response)| async move { response })
            .collect()
            .await;

        info!(
            address,
            providers = total,
            succeeded = responses.len(),
            "Geocoded with all providers"
        );
        Ok(responses)
    }

    /// Successful responses keyed by provider name, for providers in `priorities`
    ///
    /// A provider without a success is absent from the map.
    pub async fn grouped(
        &self,
        address: &str,
        priorities: &BTreeSet<i32>,
    ) -> Result<BTreeMap<String, Vec<GeocodeResponse>>, GeocodeError> {
        let address = validate_address(address)?;
        let providers = self.catalog.providers().await?;
        let selected = select_priorities(&providers, priorities);
        let total = selected.len();

        let mut groups: BTreeMap<String, Vec<GeocodeResponse>> = BTreeMap::new();
        let mut completed = fan_out(selected, address);
        while let Some((name, response)) = completed.next().await {
            if let Some(response) = response {
                groups.entry(name).or_default().push(response);
            }
        }

        info!(
            address,
            ?priorities,
            providers = total,
            succeeded = groups.len(),
            "Geocoded by priority group"
        );
        Ok(groups)
    }

    /// Response of one provider, by case-insensitive name
    ///
    /// The provider's own error propagates; an empty result list is
    /// `NoResultsFromProvider`.
    pub async fn by_name(
        &self,
        address: &str,
        name: &str,
    ) -> Result<GeocodeResponse, GeocodeError> {
        let address = validate_address(address)?;
        let provider = self.catalog.provider(name).await?;

        let response = provider.geocode(address).await?;
        if response.results.is_empty() {
            warn!(provider = %provider.name(), status = %response.status, "Provider returned no results");
            return Err(GeocodeError::NoResultsFromProvider(name.to_string()));
        }

        Ok(response)
    }
}

/// Run every provider concurrently, yielding `(name, Some(response))` on
/// success and `(name, None)` on a logged failure, in completion order
fn fan_out(
    providers: Vec<Arc<dyn GeocodingProvider>>,
    address: &str,
) -> FuturesUnordered<impl std::future::Future<Output = (String, Option<GeocodeResponse>)> + '_> {
    providers
        .into_iter()
        .map(|provider| async move {
            let name = provider.name().to_string();
            match provider.geocode(address).await {
                Ok(response) => {
                    debug!(provider = %name, "Provider succeeded");
                    (name, Some(response))
                }
                Err(e) => {
                    warn!(
                        provider = %name,
                        error = %e,
                        "Provider failed (per-provider error isolation)"
                    );
                    (name, None)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{catalog, ok_response, MockProvider};
    use std::time::{Duration, Instant};

    fn aggregator(providers: &[Arc<MockProvider>]) -> Aggregator {
        Aggregator::new(catalog(providers))
    }

    fn handles(providers: &[Arc<MockProvider>]) -> Vec<Arc<dyn GeocodingProvider>> {
        providers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn GeocodingProvider>)
            .collect()
    }

    fn names(selected: &[Arc<dyn GeocodingProvider>]) -> Vec<String> {
        let mut names: Vec<String> = selected.iter().map(|p| p.name().to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_select_best_priority_takes_minimum_ties() {
        let providers = handles(&[
            MockProvider::failing("A", 2, 0),
            MockProvider::failing("B", 1, 0),
            MockProvider::failing("C", 1, 0),
            MockProvider::failing("D", 3, 0),
        ]);
        assert_eq!(names(&select_best_priority(&providers)), vec!["B", "C"]);
    }

    #[test]
    fn test_select_best_priority_handles_negative_and_empty() {
        assert!(select_best_priority(&[]).is_empty());

        let providers = handles(&[
            MockProvider::failing("A", 0, 0),
            MockProvider::failing("B", -5, 0),
        ]);
        assert_eq!(names(&select_best_priority(&providers)), vec!["B"]);
    }

    #[test]
    fn test_select_priorities() {
        let providers = handles(&[
            MockProvider::failing("A", 1, 0),
            MockProvider::failing("B", 2, 0),
            MockProvider::failing("C", 3, 0),
        ]);
        let wanted: BTreeSet<i32> = [1, 2].into_iter().collect();
        assert_eq!(names(&select_priorities(&providers, &wanted)), vec!["A", "B"]);
        assert!(select_priorities(&providers, &BTreeSet::new()).is_empty());
    }

    #[tokio::test]
    async fn test_race_tolerates_failed_sibling() {
        // Priorities [1, 1, 2]: A fails at once, B succeeds late, C is never asked
        let a = MockProvider::failing("A", 1, 0);
        let b = MockProvider::ok("B", 1, 50, ok_response("from B", 1.0, 2.0));
        let c = MockProvider::ok("C", 2, 0, ok_response("from C", 3.0, 4.0));
        let agg = aggregator(&[a.clone(), b.clone(), c.clone()]);

        let response = agg.race_best("123 Main St").await.unwrap();
        assert_eq!(response.results[0].formatted_address, "from B");
        assert_eq!(a.call_count(), 1);
        assert_eq!(c.call_count(), 0);
    }

    #[tokio::test]
    async fn test_race_all_best_fail() {
        let agg = aggregator(&[
            MockProvider::failing("A", 1, 0),
            MockProvider::failing("B", 1, 10),
            MockProvider::ok("C", 2, 0, ok_response("from C", 0.0, 0.0)),
        ]);

        let result = agg.race_best("123 Main St").await;
        assert_eq!(
            result,
            Err(GeocodeError::NoProvidersSucceeded("123 Main St".to_string()))
        );
    }

    #[tokio::test]
    async fn test_race_no_providers() {
        let agg = aggregator(&[]);
        assert!(matches!(
            agg.race_best("123 Main St").await,
            Err(GeocodeError::NoProvidersSucceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_race_does_not_wait_for_stragglers() {
        let agg = aggregator(&[
            MockProvider::ok("Fast", 1, 10, ok_response("fast", 0.0, 0.0)),
            MockProvider::ok("Slow", 1, 2_000, ok_response("slow", 0.0, 0.0)),
        ]);

        let started = Instant::now();
        let response = agg.race_best("123 Main St").await.unwrap();
        assert_eq!(response.results[0].formatted_address, "fast");
        assert!(started.elapsed() < Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_all_collects_successes_in_completion_order() {
        let agg = aggregator(&[
            MockProvider::ok("Late", 1, 120, ok_response("late", 0.0, 0.0)),
            MockProvider::failing("Broken", 1, 0),
            MockProvider::ok("Early", 2, 10, ok_response("early", 0.0, 0.0)),
        ]);

        let responses = agg.all("123 Main St").await.unwrap();
        let labels: Vec<&str> = responses
            .iter()
            .map(|r| r.results[0].formatted_address.as_str())
            .collect();
        assert_eq!(labels, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_all_total_failure_is_empty_not_error() {
        let agg = aggregator(&[
            MockProvider::failing("A", 1, 0),
            MockProvider::failing("B", 2, 5),
        ]);
        assert_eq!(agg.all("123 Main St").await.unwrap(), vec![]);

        let agg = aggregator(&[]);
        assert!(agg.all("123 Main St").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_grouped_restricts_to_priorities() {
        let p1 = MockProvider::ok("P1", 1, 0, ok_response("p1", 0.0, 0.0));
        let p2 = MockProvider::ok("P2", 2, 0, ok_response("p2", 0.0, 0.0));
        let agg = aggregator(&[p1, p2.clone()]);

        let groups = agg
            .grouped("123 Main St", &[1].into_iter().collect())
            .await
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups["P1"], vec![ok_response("p1", 0.0, 0.0)]);
        assert!(!groups.contains_key("P2"));
        assert_eq!(p2.call_count(), 0);
    }

    #[tokio::test]
    async fn test_grouped_failed_provider_absent() {
        let agg = aggregator(&[
            MockProvider::failing("Broken", 1, 0),
            MockProvider::ok("Good", 2, 0, ok_response("good", 0.0, 0.0)),
            MockProvider::ok("Excluded", 3, 0, ok_response("excluded", 0.0, 0.0)),
        ]);

        let groups = agg
            .grouped("123 Main St", &[1, 2].into_iter().collect())
            .await
            .unwrap();

        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Good"]);
    }

    #[tokio::test]
    async fn test_by_name_case_insensitive() {
        let agg = aggregator(&[MockProvider::ok("GoogleMaps", 1, 0, ok_response("g", 1.0, 1.0))]);
        let response = agg.by_name("123 Main St", "googlemaps").await.unwrap();
        assert_eq!(response.results[0].formatted_address, "g");
    }

    #[tokio::test]
    async fn test_by_name_unknown_provider() {
        let agg = aggregator(&[MockProvider::ok("GoogleMaps", 1, 0, ok_response("g", 1.0, 1.0))]);
        assert_eq!(
            agg.by_name("123 Main St", "Nominatim").await,
            Err(GeocodeError::ProviderNotFound("Nominatim".to_string()))
        );
    }

    #[tokio::test]
    async fn test_by_name_empty_results() {
        let empty = GeocodeResponse {
            status: "ZERO_RESULTS".to_string(),
            results: vec![],
        };
        let agg = aggregator(&[MockProvider::ok("GoogleMaps", 1, 0, empty)]);
        assert_eq!(
            agg.by_name("123 Main St", "GoogleMaps").await,
            Err(GeocodeError::NoResultsFromProvider("GoogleMaps".to_string()))
        );
    }

    #[tokio::test]
    async fn test_by_name_propagates_provider_error() {
        let agg = aggregator(&[MockProvider::failing("GoogleMaps", 1, 0)]);
        assert!(matches!(
            agg.by_name("123 Main St", "GoogleMaps").await,
            Err(GeocodeError::Provider { provider, .. }) if provider == "GoogleMaps"
        ));
    }

    #[tokio::test]
    async fn test_blank_address_rejected_in_every_mode() {
        let agg = aggregator(&[MockProvider::ok("A", 1, 0, ok_response("a", 0.0, 0.0))]);
        let modes = [
            GeocodeMode::First,
            GeocodeMode::All,
            GeocodeMode::Group([1].into_iter().collect()),
            GeocodeMode::Provider("A".to_string()),
        ];

        for mode in &modes {
            assert!(matches!(
                agg.run(mode, "   ").await,
                Err(GeocodeError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_run_dispatches_shapes() {
        let agg = aggregator(&[MockProvider::ok("A", 1, 0, ok_response("a", 0.0, 0.0))]);

        assert!(matches!(
            agg.run(&GeocodeMode::First, "x").await.unwrap(),
            AggregationOutcome::Single(_)
        ));
        assert!(matches!(
            agg.run(&GeocodeMode::All, "x").await.unwrap(),
            AggregationOutcome::Union(v) if v.len() == 1
        ));
        assert!(matches!(
            agg.run(&GeocodeMode::Group([1].into_iter().collect()), "x").await.unwrap(),
            AggregationOutcome::Grouped(m) if m.contains_key("A")
        ));
    }
}
