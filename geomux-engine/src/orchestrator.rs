//! Refine-and-geocode pipeline
//!
//! Strictly sequential stages, one pass per request:
//!
//! ```text
//! Start → AIRefine → Geocode → Places → Done
//! ```
//!
//! Only Geocode is fatal. AIRefine and Places failures are absorbed into the
//! process log and the request carries on.

use crate::aggregator::{validate_address, Aggregator};
use crate::control::RequestControl;
use crate::types::{
    AddressRefiner, GeocodeError, GeocodeResponse, LatLng, PlacesSearch, RefinementContext,
};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

pub struct RefinementOrchestrator {
    refiner: Arc<dyn AddressRefiner>,
    aggregator: Aggregator,
    places: Arc<dyn PlacesSearch>,
}

impl RefinementOrchestrator {
    pub fn new(
        refiner: Arc<dyn AddressRefiner>,
        aggregator: Aggregator,
        places: Arc<dyn PlacesSearch>,
    ) -> Self {
        Self {
            refiner,
            aggregator,
            places,
        }
    }

    /// Run the whole pipeline under `control`
    ///
    /// Cancellation or deadline expiry surfaces as an error, never as a
    /// partially filled context.
    pub async fn refine_and_geocode(
        &self,
        address: &str,
        radius: i32,
        control: &RequestControl,
    ) -> Result<RefinementContext, GeocodeError> {
        let address = validate_address(address)?;
        let ctx = RefinementContext::new(address);
        let span = info_span!("refine_and_geocode", request_id = %ctx.request_id);

        control
            .run(self.pipeline(ctx, radius).instrument(span))
            .await
    }

    async fn pipeline(
        &self,
        mut ctx: RefinementContext,
        radius: i32,
    ) -> Result<RefinementContext, GeocodeError> {
        info!(address = %ctx.original_address, radius, "Refinement started");

        self.ai_refine(&mut ctx).await;
        self.geocode(&mut ctx).await?;
        self.nearby_places(&mut ctx, radius).await;

        info!(steps = ctx.process_log.len(), "Refinement done");
        Ok(ctx)
    }

    async fn ai_refine(&self, ctx: &mut RefinementContext) {
        match self.refiner.refine(&ctx.original_address).await {
            Ok(refined) if refined != ctx.original_address => {
                info!(refined = %refined, "Address refined");
                ctx.refined_address = refined;
                ctx.log("IA refined successfully");
            }
            Ok(_) => ctx.log("IA returned unchanged address"),
            Err(e) => {
                info!(error = %e, "Address refinement skipped");
                ctx.refined_address = ctx.original_address.clone();
                ctx.log(format!("IA skipped: {}", e));
            }
        }
    }

    async fn geocode(&self, ctx: &mut RefinementContext) -> Result<(), GeocodeError> {
        ctx.geocode_results = self.aggregator.all(&ctx.refined_address).await?;
        ctx.coordinates = first_coordinates(&ctx.geocode_results);
        ctx.log("Geocode completed");
        Ok(())
    }

    async fn nearby_places(&self, ctx: &mut RefinementContext, radius: i32) {
        let radius_meters = u32::try_from(radius).ok().filter(|r| *r > 0);

        let (Some(coords), Some(radius_meters)) = (ctx.coordinates, radius_meters) else {
            let mut unmet = Vec::new();
            if ctx.coordinates.is_none() {
                unmet.push("no coordinates from geocode results".to_string());
            }
            if radius_meters.is_none() {
                unmet.push(format!("radius must be greater than 0 (got {})", radius));
            }
            let reason = unmet.join("; ");
            info!(reason = %reason, "Places search skipped");
            ctx.log(format!("Places skipped: {}", reason));
            return;
        };

        match self
            .places
            .search_nearby(coords.lat, coords.lng, radius_meters)
            .await
        {
            Ok(places) => {
                info!(found = places.results.len(), radius_meters, "Places search completed");
                ctx.nearby_places = Some(places);
                ctx.used_radius = Some(radius_meters);
                ctx.log("Places search completed");
            }
            Err(e) => {
                info!(error = %e, "Places search skipped");
                ctx.log(format!("Places skipped: {}", e));
            }
        }
    }
}

/// Coordinates of the first usable response (first match, not best match)
///
/// If that response's first result has no location, there are no
/// coordinates; later responses are not consulted.
pub fn first_coordinates(responses: &[GeocodeResponse]) -> Option<LatLng> {
    responses
        .iter()
        .find(|r| r.is_usable())
        .and_then(|r| r.results.first())
        .and_then(|result| result.coordinates())
}
