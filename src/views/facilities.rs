use super::{FormState, ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::descriptors::{Describe, Descriptor};
use crate::core::filters::{AllOf, FieldMatch, SearchText, Selection};
use crate::core::formatters::{format_hourly_rate, format_rating};
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{Facility, FacilityType, NewFacility};
use crate::query_key;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRow {
    pub facility: Facility,
    pub kind: Descriptor,
    pub rate: String,
    pub rating: String,
    pub capacity: String,
}

impl From<Facility> for FacilityRow {
    fn from(facility: Facility) -> Self {
        Self {
            kind: facility.kind.descriptor(),
            rate: format_hourly_rate(facility.hourly_rate),
            rating: format_rating(facility.rating),
            capacity: format!("Up to {} people", facility.capacity),
            facility,
        }
    }
}

fn create_facility(variables: Value) -> AppResult<Command> {
    Ok(Command::CreateFacility(serde_json::from_value(variables)?))
}

fn kind_of(facility: &Facility) -> Option<FacilityType> {
    Some(facility.kind.clone())
}

fn availability_of(facility: &Facility) -> Option<bool> {
    Some(facility.is_available())
}

pub struct FacilitiesView {
    ctx: ViewContext,
    facilities: ResourceView<Vec<Facility>>,
    create: Mutation,
    search: SearchText,
    kind: Selection<FacilityType>,
    available: Selection<bool>,
    form: FormState,
}

impl FacilitiesView {
    pub fn key() -> QueryKey {
        query_key!["facilities"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        let create = ctx.command_mutation(
            "create facility",
            vec![Self::key(), query_key!["dashboard"]],
            create_facility,
        );
        Self {
            ctx: ctx.clone(),
            facilities: ResourceView::mount(ctx, Self::key(), QueryOptions::default()),
            create,
            search: SearchText::default(),
            kind: Selection::All,
            available: Selection::All,
            form: FormState::default(),
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = SearchText::new(text);
    }

    pub fn set_type_filter(&mut self, raw: &str) {
        self.kind = Selection::parse(raw);
    }

    /// `"available"`, `"booked"` or `"all"`.
    pub fn set_availability_filter(&mut self, raw: &str) {
        self.available = match raw.trim().to_ascii_lowercase().as_str() {
            "available" => Selection::Only(true),
            "booked" | "unavailable" => Selection::Only(false),
            _ => Selection::All,
        };
    }

    pub fn render(&self) -> AppResult<ListView<FacilityRow>> {
        let filter: AllOf<'_, Facility> = AllOf::new()
            .and(&self.search)
            .and(FieldMatch::new(self.kind.clone(), kind_of))
            .and(FieldMatch::new(self.available.clone(), availability_of));
        Ok(self.facilities.render(&filter)?.map(FacilityRow::from))
    }

    pub fn available_count(&self) -> AppResult<usize> {
        Ok(self
            .facilities
            .records()?
            .iter()
            .filter(|facility| facility.is_available())
            .count())
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<Facility>> {
        &mut self.facilities
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn open_form(&mut self) {
        self.form.open();
    }

    pub fn close_form(&mut self) {
        self.form.close();
    }

    pub fn is_submitting(&self) -> bool {
        self.create.is_pending()
    }

    pub async fn submit(&mut self, draft: NewFacility) -> AppResult<Facility> {
        let validation = draft.validate();
        self.form
            .submit(
                &self.create,
                &self.ctx.toaster,
                &draft,
                validation,
                Notice::info("Facility Added", "New facility has been successfully added."),
                "Failed to add facility. Please try again.",
            )
            .await
    }
}
