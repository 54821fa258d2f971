//! The printable blank questionnaire.

use crate::domain::document::{Document, Prompt, Section};

pub const QUESTIONNAIRE_HEADING: &str =
    "Questionnaire Étude de Marché – Médecine Naturelle au Sénégal";
pub const BLANK_FILENAME: &str = "Questionnaire_Medecine_Naturelle_Interactif.pdf";

const BLANK_LINE: &str = "___________________________";
const OTHER_OPTION: &str = "Autre: __________";

fn blank(label: &str) -> Prompt {
    Prompt::free_text(format!("{label} {BLANK_LINE}"))
}

pub fn blank_questionnaire() -> Document {
    Document::new(vec![
        Section::new(
            "Section 1 : Informations générales",
            vec![
                blank("Nom (facultatif) :"),
                Prompt::free_text("Âge : ____ ans"),
                Prompt::choice("Sexe :", ["Homme", "Femme", "Autre"]),
                blank("Ville/Région :"),
                blank("Profession :"),
            ],
        ),
        Section::new(
            "Section 2 : Connaissance et utilisation",
            vec![
                Prompt::choice("Connaissez-vous la médecine naturelle ?", ["Oui", "Non"]),
                Prompt::choice(
                    "Avez-vous déjà utilisé des plantes médicinales ?",
                    ["Oui, régulièrement", "Oui, parfois", "Non, jamais"],
                ),
                Prompt::choice(
                    "Si oui, pour quels types de soins ?",
                    [
                        "Digestion",
                        "Stress / sommeil",
                        "Vitalité / énergie",
                        "Soins de la peau / cheveux",
                        OTHER_OPTION,
                    ],
                ),
            ],
        ),
        Section::new(
            "Section 3 : Fréquence et préférences",
            vec![
                Prompt::choice(
                    "À quelle fréquence utilisez-vous des produits naturels ?",
                    ["Quotidiennement", "Hebdomadairement", "Mensuellement", "Rarement"],
                ),
                Prompt::choice(
                    "Où achetez-vous principalement ces produits ?",
                    [
                        "Marchés locaux",
                        "Pharmacies",
                        "Boutiques spécialisées",
                        "En ligne",
                        OTHER_OPTION,
                    ],
                ),
                Prompt::choice(
                    "Préférez-vous :",
                    ["Produits bruts", "Produits transformés", "Peu importe"],
                ),
            ],
        ),
        Section::new(
            "Section 4 : Motivations et attentes",
            vec![
                Prompt::choice(
                    "Quelles sont vos principales motivations ?",
                    [
                        "Prévention santé",
                        "Remèdes alternatifs",
                        "Bien-être général",
                        "Tradition / culture",
                        OTHER_OPTION,
                    ],
                ),
                blank("Quels critères sont importants pour l'achat de produits naturels ?"),
            ],
        ),
        Section::new(
            "Section 5 : Intérêt pour les services",
            vec![
                Prompt::choice(
                    "Seriez-vous intéressé(e) par :",
                    [
                        "Consultations",
                        "Formations / ateliers",
                        "Abonnements produits naturels",
                        "Conseils personnalisés",
                    ],
                ),
                Prompt::choice(
                    "Combien seriez-vous prêt(e) à payer ?",
                    [
                        "< 5 000 FCFA",
                        "5 000 – 10 000 FCFA",
                        "10 000 – 20 000 FCFA",
                        "> 20 000 FCFA",
                    ],
                ),
            ],
        ),
        Section::new(
            "Section 6 : Suggestions",
            vec![
                blank("Quels types de produits ou services souhaiteriez-vous voir développés ?"),
                blank("Autres commentaires :"),
            ],
        ),
    ])
    .with_heading(QUESTIONNAIRE_HEADING)
}
