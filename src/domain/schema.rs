//! Versioned description of a survey response.
//!
//! The schema is the single source of truth for field order, display labels
//! and value kinds. Form intake, the CSV export and the per-record document
//! all walk it instead of enumerating struct fields by hand.

/// Bumped whenever a field is added, removed or changes kind.
pub const SCHEMA_VERSION: u32 = 2;

/// Ceiling for free-text answers, in characters.
pub const LONG_TEXT_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> ChoiceOption {
    ChoiceOption { value, label }
}

pub const SEX_CHOICES: &[ChoiceOption] = &[
    option("Homme", "Homme"),
    option("Femme", "Femme"),
    option("Autre", "Autre"),
];

pub const PLANT_USAGE_CHOICES: &[ChoiceOption] = &[
    option("Regulierement", "Oui, régulièrement"),
    option("Parfois", "Oui, parfois"),
    option("Jamais", "Non, jamais"),
];

pub const FREQUENCY_CHOICES: &[ChoiceOption] = &[
    option("Quotidien", "Quotidiennement"),
    option("Hebdomadaire", "Hebdomadairement"),
    option("Mensuel", "Mensuellement"),
    option("Rarement", "Rarement"),
];

pub const PRODUCT_TYPE_CHOICES: &[ChoiceOption] = &[
    option("Bruts", "Produits bruts"),
    option("Transformes", "Produits transformés"),
    option("Peuimporte", "Peu importe"),
];

pub const BUDGET_CHOICES: &[ChoiceOption] = &[
    option("<5000", "< 5 000 FCFA"),
    option("5000-10000", "5 000 – 10 000 FCFA"),
    option("10000-20000", "10 000 – 20 000 FCFA"),
    option(">20000", "> 20 000 FCFA"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Store-assigned primary key.
    Identifier,
    /// Single-line text with a length ceiling in characters.
    Text { max_len: usize },
    /// Multi-line text with a length ceiling in characters.
    LongText { max_len: usize },
    /// Optional integer with an inclusive lower bound.
    Integer { min: i64 },
    Boolean,
    Choice(&'static [ChoiceOption]),
    /// Store-assigned creation time.
    Timestamp,
    /// Reference to a collection of other records. Never rendered or exported.
    Relation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldGroup {
    General,
    Knowledge,
    Habits,
    Motivations,
    Services,
    Suggestions,
    Metadata,
}

impl FieldGroup {
    pub fn title(self) -> &'static str {
        match self {
            FieldGroup::General => "Section 1 : Informations générales",
            FieldGroup::Knowledge => "Section 2 : Connaissance et utilisation",
            FieldGroup::Habits => "Section 3 : Fréquence et préférences",
            FieldGroup::Motivations => "Section 4 : Motivations et attentes",
            FieldGroup::Services => "Section 5 : Intérêt pour les services",
            FieldGroup::Suggestions => "Section 6 : Suggestions",
            FieldGroup::Metadata => "Informations d'enregistrement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub group: FieldGroup,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        group: FieldGroup,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            group,
        }
    }

    /// Whether respondents supply this field through the form.
    pub fn is_editable(&self) -> bool {
        !matches!(
            self.kind,
            FieldKind::Identifier | FieldKind::Timestamp | FieldKind::Relation
        )
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation)
    }

    pub fn choices(&self) -> Option<&'static [ChoiceOption]> {
        match self.kind {
            FieldKind::Choice(options) => Some(options),
            _ => None,
        }
    }

    /// Display label for a stored choice value, if this is a choice field and
    /// the value is one of its options.
    pub fn choice_label(&self, value: &str) -> Option<&'static str> {
        self.choices()?
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label)
    }
}

pub static RESPONSE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", "Identifiant", FieldKind::Identifier, FieldGroup::Metadata),
    FieldSpec::new("name", "Nom", FieldKind::Text { max_len: 100 }, FieldGroup::General),
    FieldSpec::new("age", "Âge", FieldKind::Integer { min: 0 }, FieldGroup::General),
    FieldSpec::new("sex", "Sexe", FieldKind::Choice(SEX_CHOICES), FieldGroup::General),
    FieldSpec::new(
        "city",
        "Ville/Région",
        FieldKind::Text { max_len: 100 },
        FieldGroup::General,
    ),
    FieldSpec::new(
        "occupation",
        "Profession",
        FieldKind::Text { max_len: 100 },
        FieldGroup::General,
    ),
    FieldSpec::new(
        "knows_natural_medicine",
        "Connaissez-vous la médecine naturelle ?",
        FieldKind::Boolean,
        FieldGroup::Knowledge,
    ),
    FieldSpec::new(
        "plant_usage",
        "Avez-vous déjà utilisé des plantes médicinales ?",
        FieldKind::Choice(PLANT_USAGE_CHOICES),
        FieldGroup::Knowledge,
    ),
    FieldSpec::new(
        "care_types",
        "Pour quels types de soins ?",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Knowledge,
    ),
    FieldSpec::new(
        "frequency",
        "À quelle fréquence utilisez-vous des produits naturels ?",
        FieldKind::Choice(FREQUENCY_CHOICES),
        FieldGroup::Habits,
    ),
    FieldSpec::new(
        "purchase_places",
        "Où achetez-vous principalement ces produits ?",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Habits,
    ),
    FieldSpec::new(
        "product_type",
        "Préférez-vous",
        FieldKind::Choice(PRODUCT_TYPE_CHOICES),
        FieldGroup::Habits,
    ),
    FieldSpec::new(
        "motivations",
        "Quelles sont vos principales motivations ?",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Motivations,
    ),
    FieldSpec::new(
        "purchase_criteria",
        "Quels critères sont importants pour l'achat de produits naturels ?",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Motivations,
    ),
    FieldSpec::new(
        "service_interests",
        "Seriez-vous intéressé(e) par",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Services,
    ),
    FieldSpec::new(
        "budget",
        "Combien seriez-vous prêt(e) à payer ?",
        FieldKind::Choice(BUDGET_CHOICES),
        FieldGroup::Services,
    ),
    FieldSpec::new(
        "suggestions",
        "Quels types de produits ou services souhaiteriez-vous voir développés ?",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Suggestions,
    ),
    FieldSpec::new(
        "comments",
        "Autres commentaires",
        FieldKind::LongText { max_len: LONG_TEXT_MAX_LEN },
        FieldGroup::Suggestions,
    ),
    FieldSpec::new(
        "created_at",
        "Date de réponse",
        FieldKind::Timestamp,
        FieldGroup::Metadata,
    ),
];

pub fn find_field(name: &str) -> Option<&'static FieldSpec> {
    RESPONSE_SCHEMA.iter().find(|spec| spec.name == name)
}

/// Names of every exportable field, in schema order.
pub fn exportable_field_names(schema: &[FieldSpec]) -> Vec<&'static str> {
    schema
        .iter()
        .filter(|spec| !spec.is_relation())
        .map(|spec| spec.name)
        .collect()
}

/// Choice fields the dashboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceField {
    Sex,
    PlantUsage,
    Frequency,
    ProductType,
    Budget,
}

impl ChoiceField {
    pub const ALL: [ChoiceField; 5] = [
        ChoiceField::Sex,
        ChoiceField::PlantUsage,
        ChoiceField::Frequency,
        ChoiceField::ProductType,
        ChoiceField::Budget,
    ];

    /// Column backing the field. Doubles as the schema field name.
    pub fn column(self) -> &'static str {
        match self {
            ChoiceField::Sex => "sex",
            ChoiceField::PlantUsage => "plant_usage",
            ChoiceField::Frequency => "frequency",
            ChoiceField::ProductType => "product_type",
            ChoiceField::Budget => "budget",
        }
    }

    pub fn options(self) -> &'static [ChoiceOption] {
        match self {
            ChoiceField::Sex => SEX_CHOICES,
            ChoiceField::PlantUsage => PLANT_USAGE_CHOICES,
            ChoiceField::Frequency => FREQUENCY_CHOICES,
            ChoiceField::ProductType => PRODUCT_TYPE_CHOICES,
            ChoiceField::Budget => BUDGET_CHOICES,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChoiceField::Sex => "Répartition par sexe",
            ChoiceField::PlantUsage => "Utilisation de plantes médicinales",
            ChoiceField::Frequency => "Fréquence d'utilisation",
            ChoiceField::ProductType => "Type de produit préféré",
            ChoiceField::Budget => "Budget envisagé",
        }
    }

    /// Display label for a stored value; blank answers get a placeholder.
    pub fn display_label(self, value: &str) -> String {
        if value.is_empty() {
            return "Non renseigné".to_string();
        }
        self.options()
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.to_string())
            .unwrap_or_else(|| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_names_are_unique() {
        let names: HashSet<_> = RESPONSE_SCHEMA.iter().map(|spec| spec.name).collect();
        assert_eq!(names.len(), RESPONSE_SCHEMA.len());
    }

    #[test]
    fn every_choice_field_matches_its_schema_entry() {
        for field in ChoiceField::ALL {
            let spec = find_field(field.column()).expect("choice field in schema");
            assert_eq!(spec.choices(), Some(field.options()));
        }
    }

    #[test]
    fn display_label_falls_back_for_blank_and_unknown_values() {
        assert_eq!(ChoiceField::Sex.display_label(""), "Non renseigné");
        assert_eq!(ChoiceField::Budget.display_label("<5000"), "< 5 000 FCFA");
        assert_eq!(ChoiceField::Frequency.display_label("Parfois"), "Parfois");
    }

    #[test]
    fn choice_label_maps_stored_keys() {
        let spec = find_field("plant_usage").expect("plant_usage field");
        assert_eq!(spec.choice_label("Parfois"), Some("Oui, parfois"));
        assert_eq!(spec.choice_label("Souvent"), None);
        assert_eq!(find_field("name").and_then(|s| s.choice_label("x")), None);
    }

    #[test]
    fn exportable_names_skip_relations() {
        let schema = [
            FieldSpec::new("id", "Id", FieldKind::Identifier, FieldGroup::Metadata),
            FieldSpec::new("tags", "Tags", FieldKind::Relation, FieldGroup::Metadata),
            FieldSpec::new(
                "name",
                "Nom",
                FieldKind::LongText { max_len: 200 },
                FieldGroup::General,
            ),
        ];
        assert_eq!(exportable_field_names(&schema), vec!["id", "name"]);
    }

    #[test]
    fn every_free_text_answer_is_bounded() {
        let long_text: Vec<_> = RESPONSE_SCHEMA
            .iter()
            .filter_map(|spec| match spec.kind {
                FieldKind::LongText { max_len } => Some(max_len),
                _ => None,
            })
            .collect();
        assert_eq!(long_text.len(), 7);
        assert!(long_text.iter().all(|max_len| *max_len == LONG_TEXT_MAX_LEN));
    }

    #[test]
    fn identifier_and_timestamp_are_not_editable() {
        let editable: Vec<_> = RESPONSE_SCHEMA
            .iter()
            .filter(|spec| spec.is_editable())
            .map(|spec| spec.name)
            .collect();
        assert!(!editable.contains(&"id"));
        assert!(!editable.contains(&"created_at"));
        assert_eq!(editable.len(), RESPONSE_SCHEMA.len() - 2);
    }
}
