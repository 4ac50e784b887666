//! Patient record data model.
//!
//! A patient is an aggregate of five fixed sub-sections, keyed by cédula
//! (the national identity number, the natural lookup key) plus the opaque
//! storage identifier assigned by the backend.
//!
//! The wire format keeps the backend's Spanish field names (`nombreCompleto`,
//! `tipoDiscapacidad`, …); serde renames map them to English struct fields so
//! the two vocabularies never mix inside the codebase. Records are read-only
//! from this client — there is no create/update/delete path.

use serde::{Deserialize, Serialize};

/// A complete patient record as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Backend storage identifier. Absent on records that never round-tripped
    /// through the store.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub personal: PersonalData,

    #[serde(rename = "sociodemografico")]
    pub sociodemographic: SociodemographicData,

    #[serde(rename = "academico")]
    pub academic: AcademicData,

    #[serde(rename = "salud")]
    pub health: HealthData,

    #[serde(rename = "laboral")]
    pub employment: EmploymentData,
}

/// Personal identity section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalData {
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
    pub cedula: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "edad")]
    pub age: u32,
    #[serde(rename = "genero")]
    pub gender: String,
    #[serde(rename = "estadoCivil")]
    pub marital_status: String,
    #[serde(rename = "lugarNacimiento")]
    pub birth_place: String,
    #[serde(rename = "nacionalidad")]
    pub nationality: String,
}

/// Sociodemographic and contact section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SociodemographicData {
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "barrio")]
    pub neighborhood: String,
    #[serde(rename = "localidad")]
    pub locality: String,
    #[serde(rename = "estrato")]
    pub stratum: u8,
    #[serde(rename = "telefono")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "tipoVivienda")]
    pub housing_type: String,
    #[serde(rename = "personasACargo")]
    pub dependents: u32,
}

/// Academic history section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicData {
    #[serde(rename = "nivelEducativo")]
    pub education_level: String,
    #[serde(rename = "tituloObtenido")]
    pub degree: String,
    #[serde(rename = "institucion")]
    pub institution: String,
    #[serde(rename = "anoGraduacion")]
    pub graduation_year: u32,
}

/// Health and clinical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    pub eps: String,
    #[serde(rename = "regimen")]
    pub regime: String,
    #[serde(rename = "tipoDiscapacidad")]
    pub disability_type: String,
    #[serde(rename = "diagnosticoPrincipal")]
    pub primary_diagnosis: String,
    #[serde(rename = "antecedentesMedicos")]
    pub medical_history: Vec<String>,
    #[serde(rename = "medicamentosActuales")]
    pub current_medications: Vec<String>,
    #[serde(rename = "ultimaConsulta")]
    pub last_consultation: String,
}

/// Employment section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentData {
    #[serde(rename = "situacionLaboral")]
    pub employment_status: String,
    #[serde(rename = "ocupacion")]
    pub occupation: String,
    #[serde(rename = "empresa")]
    pub company: String,
    #[serde(rename = "ingresosMensuales")]
    pub monthly_income: String,
}
