//! Reference values for the categorical dimensions.

use crate::domain::record::Dimension;
use std::collections::BTreeMap;

pub const REGIONS: [&str; 5] = ["Norte", "Nordeste", "Centro-Oeste", "Sudeste", "Sul"];

pub const SIZE_TIERS: [&str; 5] = ["MEI", "Micro", "Pequeno", "Médio", "Grande"];

pub const GENDERS: [&str; 2] = ["Feminino", "Masculino"];

pub const ORIGINS: [&str; 2] = ["Recursos Livres", "Recursos Direcionados"];

pub const MODALITIES: [&str; 6] = [
    "Capital de Giro até 365 dias",
    "Capital de Giro acima 365 dias",
    "Investimento",
    "Cartão de Crédito",
    "Cheque Especial",
    "Outros",
];

const STATES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AM", "Amazonas"),
    ("AP", "Amapá"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MG", "Minas Gerais"),
    ("MS", "Mato Grosso do Sul"),
    ("MT", "Mato Grosso"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("PR", "Paraná"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("RS", "Rio Grande do Sul"),
    ("SC", "Santa Catarina"),
    ("SE", "Sergipe"),
    ("SP", "São Paulo"),
    ("TO", "Tocantins"),
];

/// State code to state name for the 27 federative units.
pub fn default_state_names() -> BTreeMap<String, String> {
    STATES
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

/// The reference values of a dimension, in presentation order.
pub fn known_values(dimension: Dimension) -> Vec<&'static str> {
    match dimension {
        Dimension::Size => SIZE_TIERS.to_vec(),
        Dimension::Gender => GENDERS.to_vec(),
        Dimension::Region => REGIONS.to_vec(),
        Dimension::State => STATES.iter().map(|(code, _)| *code).collect(),
        Dimension::Origin => ORIGINS.to_vec(),
        Dimension::Modality => MODALITIES.to_vec(),
    }
}
