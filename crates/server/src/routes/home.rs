//! Subscribe page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use dish_digest_core::DailyPicks;

use crate::state::AppState;

/// Meal slots shown in serving order; anything else sorts after these,
/// alphabetically.
const SLOT_ORDER: &[&str] = &["breakfast", "brunch", "lunch", "dinner"];

/// Subscribe page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomePage {
    pub picks: Option<PicksView>,
}

/// Today's picks prepared for rendering.
pub struct PicksView {
    pub date: String,
    pub meals: Vec<MealView>,
}

/// One meal slot.
pub struct MealView {
    pub name: String,
    pub picks: Vec<EateryView>,
}

/// One eatery with its picked dishes and resolved location.
pub struct EateryView {
    pub eatery: String,
    pub location: Option<String>,
    pub dishes: Vec<String>,
}

/// Render the subscribe page.
///
/// The picks read is best-effort: an absent record or a store failure
/// renders the page without picks, never an error.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomePage {
    let picks = match state.store().latest_picks().await {
        Ok(picks) => picks.map(build_view),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read picks, rendering without them");
            None
        }
    };

    HomePage { picks }
}

/// Flatten the stored payload into render-ready rows, resolving eatery
/// locations and ordering meal slots.
fn build_view(picks: DailyPicks) -> PicksView {
    let mut meals: Vec<(String, Vec<EateryView>)> = picks
        .meals
        .iter()
        .map(|(name, slot)| {
            let eateries = slot
                .picks
                .iter()
                .map(|pick| EateryView {
                    eatery: pick.eatery.clone(),
                    location: picks.location_of(&pick.eatery).map(str::to_owned),
                    dishes: pick.dishes.clone(),
                })
                .collect();
            (name.clone(), eateries)
        })
        .collect();

    meals.sort_by_key(|(name, _)| slot_rank(name));

    PicksView {
        date: picks.date_str.clone(),
        meals: meals
            .into_iter()
            .map(|(name, picks)| MealView { name, picks })
            .collect(),
    }
}

fn slot_rank(name: &str) -> (usize, String) {
    let position = SLOT_ORDER
        .iter()
        .position(|slot| *slot == name)
        .unwrap_or(SLOT_ORDER.len());
    (position, name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_view_orders_meal_slots() {
        let picks: DailyPicks = serde_json::from_str(
            r#"{
                "date_str": "Friday",
                "meals": {
                    "dinner": {"picks": []},
                    "breakfast": {"picks": []},
                    "teatime": {"picks": []},
                    "lunch": {"picks": []}
                }
            }"#,
        )
        .unwrap();

        let view = build_view(picks);
        let names: Vec<&str> = view.meals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["breakfast", "lunch", "dinner", "teatime"]);
    }

    #[test]
    fn test_build_view_resolves_locations() {
        let picks: DailyPicks = serde_json::from_str(
            r#"{
                "date_str": "Friday",
                "meals": {
                    "lunch": {"picks": [
                        {"eatery": "Morrison", "dishes": ["Pho"]},
                        {"eatery": "Okenshields", "dishes": ["Pizza"]}
                    ]}
                },
                "location_map": {"Morrison": "North Campus"}
            }"#,
        )
        .unwrap();

        let view = build_view(picks);
        let lunch = view.meals.first().unwrap();
        assert_eq!(lunch.picks[0].location.as_deref(), Some("North Campus"));
        assert_eq!(lunch.picks[1].location, None);
    }
}
