// Document Service: maps each letter type to its template, renders it and
// hands the text to the compliance reviewer.

pub mod fields;
pub mod handlers;
pub mod naming;
pub mod service;

use serde::Serialize;

/// The four letter types. Each maps to a fixed template, filename prefix and
/// review label; none of these come from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Offer,
    Appointment,
    Termination,
    Experience,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Offer,
        DocumentType::Appointment,
        DocumentType::Termination,
        DocumentType::Experience,
    ];

    /// File name inside the templates directory.
    pub fn template_file(self) -> &'static str {
        match self {
            DocumentType::Offer => "offer_letter_template.docx",
            DocumentType::Appointment => "appointment_letter_template.docx",
            DocumentType::Termination => "termination_letter_template.docx",
            DocumentType::Experience => "experience_letter_template.docx",
        }
    }

    /// Prefix of generated output filenames.
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentType::Offer => "OfferLetter",
            DocumentType::Appointment => "AppointmentLetter",
            DocumentType::Termination => "TerminationLetter",
            DocumentType::Experience => "ExperienceLetter",
        }
    }

    /// Human-readable name passed to the reviewer.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Offer => "Offer letter",
            DocumentType::Appointment => "Appointment letter",
            DocumentType::Termination => "Termination letter",
            DocumentType::Experience => "Experience letter",
        }
    }

    /// Generation route for this type.
    pub fn route(self) -> &'static str {
        match self {
            DocumentType::Offer => "/generate-offer-letter",
            DocumentType::Appointment => "/generate-appointment-letter",
            DocumentType::Termination => "/generate-termination-letter",
            DocumentType::Experience => "/generate-experience-letter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_document_type_table_has_distinct_entries() {
        let templates: HashSet<_> = DocumentType::ALL.iter().map(|t| t.template_file()).collect();
        let prefixes: HashSet<_> = DocumentType::ALL.iter().map(|t| t.prefix()).collect();
        let routes: HashSet<_> = DocumentType::ALL.iter().map(|t| t.route()).collect();

        assert_eq!(templates.len(), 4);
        assert_eq!(prefixes.len(), 4);
        assert_eq!(routes.len(), 4);
    }

    #[test]
    fn test_offer_letter_mapping() {
        assert_eq!(DocumentType::Offer.template_file(), "offer_letter_template.docx");
        assert_eq!(DocumentType::Offer.prefix(), "OfferLetter");
        assert_eq!(DocumentType::Offer.label(), "Offer letter");
    }
}
