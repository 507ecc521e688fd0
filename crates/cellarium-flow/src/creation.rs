// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft state for creating a wine (and, inline, a region) from the wizard.

use cellarium_core::{CellarError, ImageUpload, NewRegion, Region, WineDraft};
use tracing::debug;

/// The nested "create new wine" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WineCreation {
    draft: WineDraft,
}

impl WineCreation {
    /// Starts a draft with the search text as the name.
    pub fn prefilled(query: &str) -> Self {
        Self {
            draft: WineDraft {
                name: query.trim().to_string(),
                ..WineDraft::default()
            },
        }
    }

    pub fn draft(&self) -> &WineDraft {
        &self.draft
    }

    /// Direct access for fields without cross-field rules (vintage, type,
    /// grapes, notes, rating).
    pub fn draft_mut(&mut self) -> &mut WineDraft {
        &mut self.draft
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    /// Changes the country. A selected region from another country is
    /// dropped; a region without a known country is kept.
    pub fn set_country(&mut self, country: Option<String>) {
        let country = country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let mismatched = match (&self.draft.region, &country) {
            (Some(region), Some(country)) => region
                .country
                .as_deref()
                .is_some_and(|rc| !rc.eq_ignore_ascii_case(country)),
            (Some(region), None) => region.country.is_some(),
            (None, _) => false,
        };
        if mismatched {
            debug!("country changed, clearing selected region");
            self.draft.region = None;
        }
        self.draft.country = country;
    }

    /// Selects a region. Fills in the country when none was chosen yet.
    pub fn select_region(&mut self, region: Region) {
        if self.draft.country.is_none() {
            self.draft.country = region.country.clone();
        }
        self.draft.region = Some(region);
    }

    pub fn clear_region(&mut self) {
        self.draft.region = None;
    }

    pub fn set_image(&mut self, image: Option<ImageUpload>) {
        self.draft.image = image;
    }

    pub fn country(&self) -> Option<&str> {
        self.draft.country.as_deref()
    }

    /// The draft ready to send, with the name trimmed.
    pub fn validated(&self) -> Result<WineDraft, CellarError> {
        let name = self.draft.name.trim();
        if name.is_empty() {
            return Err(CellarError::Validation("wine name is required".to_string()));
        }
        if let Some(rating) = self.draft.rating
            && rating > 5
        {
            return Err(CellarError::Validation(
                "rating must be between 0 and 5".to_string(),
            ));
        }
        Ok(WineDraft {
            name: name.to_string(),
            ..self.draft.clone()
        })
    }
}

/// Validates the inline "add region" form.
pub fn new_region(name: &str, country: Option<&str>) -> Result<NewRegion, CellarError> {
    let name = name.trim();
    let country = country.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(CellarError::Validation("region name is required".to_string()));
    }
    if country.is_empty() {
        return Err(CellarError::Validation(
            "select a country before adding a region".to_string(),
        ));
    }
    Ok(NewRegion {
        name: name.to_string(),
        country: country.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellarium_core::RegionId;

    fn rioja() -> Region {
        Region {
            id: RegionId(1),
            name: "Rioja".into(),
            country: Some("Spain".into()),
        }
    }

    #[test]
    fn name_is_prefilled_and_required() {
        let creation = WineCreation::prefilled("  Tempranillo ");
        assert_eq!(creation.draft().name, "Tempranillo");

        let blank = WineCreation::prefilled("   ");
        let err = blank.validated().unwrap_err();
        assert_eq!(err.to_string(), "wine name is required");
    }

    #[test]
    fn changing_country_drops_foreign_region() {
        let mut creation = WineCreation::prefilled("x");
        creation.select_region(rioja());
        assert_eq!(creation.country(), Some("Spain"));

        creation.set_country(Some("spain".into()));
        assert!(creation.draft().region.is_some());

        creation.set_country(Some("France".into()));
        assert!(creation.draft().region.is_none());
        assert_eq!(creation.country(), Some("France"));
    }

    #[test]
    fn region_keeps_explicit_country() {
        let mut creation = WineCreation::prefilled("x");
        creation.set_country(Some("Argentina".into()));
        creation.select_region(rioja());
        assert_eq!(creation.country(), Some("Argentina"));
    }

    #[test]
    fn region_form_requires_name_and_country() {
        assert!(new_region("", Some("Italy")).is_err());
        assert!(new_region("Etna", None).is_err());
        assert!(new_region("Etna", Some(" ")).is_err());
        let region = new_region(" Etna ", Some("Italy")).unwrap();
        assert_eq!(region.name, "Etna");
    }
}
