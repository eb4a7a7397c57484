//! Content-derived identity and validation status.

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

use crate::candidates::PrimaryValues;
use crate::models::{Field, ValidationStatus};

/// Length of a draft id in base-32 characters.
pub const ID_LENGTH: usize = 16;

/// Fields that must all be present for a draft to be `ok`.
pub const CRITICAL_FIELDS: [Field; 6] = [
    Field::Empresa,
    Field::CnpjEmpresa,
    Field::Colaborador,
    Field::CpfColaborador,
    Field::Mes,
    Field::ValorLiquido,
];

/// Stable id from the identifying fields and the source filename.
///
/// The same inputs always give the same id; any differing input gives a
/// different one.
pub fn compute_id(empresa: &str, cnpj: &str, colaborador: &str, mes: &str, fonte: &str) -> String {
    let digest = Sha256::digest(format!("{}|{}|{}|{}|{}", empresa, cnpj, colaborador, mes, fonte));
    let mut id = BASE32_NOPAD.encode(&digest);
    id.truncate(ID_LENGTH);
    id
}

/// Id for a set of selected values.
pub fn id_for(values: &PrimaryValues, fonte: &str) -> String {
    compute_id(
        values.get(Field::Empresa),
        values.get(Field::CnpjEmpresa),
        values.get(Field::Colaborador),
        values.get(Field::Mes),
        fonte,
    )
}

/// Critical fields that are still empty.
pub fn missing_critical(get: impl Fn(Field) -> bool) -> Vec<Field> {
    CRITICAL_FIELDS.iter().copied().filter(|f| !get(*f)).collect()
}

/// `ok` when every critical field is set. Advisory only.
pub fn validation_status(values: &PrimaryValues) -> ValidationStatus {
    if missing_critical(|f| values.is_set(f)).is_empty() {
        ValidationStatus::Ok
    } else {
        ValidationStatus::Pendente
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_digest_prefix() {
        let digest = Sha256::digest("ACME|12.345.678/0001-90|JOAO|2024-07|julho.pdf");
        let id = compute_id("ACME", "12.345.678/0001-90", "JOAO", "2024-07", "julho.pdf");
        assert_eq!(id, BASE32_NOPAD.encode(&digest)[..ID_LENGTH]);
    }

    #[test]
    fn test_id_is_deterministic() {
        let a = compute_id("ACME", "12.345.678/0001-90", "JOAO", "2024-07", "julho.pdf");
        let b = compute_id("ACME", "12.345.678/0001-90", "JOAO", "2024-07", "julho.pdf");
        assert_eq!(a, b);
        assert_eq!(a.len(), ID_LENGTH);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn test_id_differs_across_employees_and_periods() {
        let base = compute_id("ACME", "12.345.678/0001-90", "JOAO", "2024-07", "a.pdf");
        let other_employee = compute_id("ACME", "12.345.678/0001-90", "MARIA", "2024-07", "a.pdf");
        let other_period = compute_id("ACME", "12.345.678/0001-90", "JOAO", "2024-08", "a.pdf");
        assert_ne!(base, other_employee);
        assert_ne!(base, other_period);
        assert_ne!(other_employee, other_period);
    }

    #[test]
    fn test_field_separator_prevents_shifted_collisions() {
        assert_ne!(
            compute_id("AB", "C", "", "", ""),
            compute_id("A", "BC", "", "", "")
        );
    }

    #[test]
    fn test_missing_critical() {
        let missing = missing_critical(|f| f != Field::CpfColaborador && f != Field::ValorLiquido);
        assert_eq!(missing, vec![Field::CpfColaborador, Field::ValorLiquido]);
    }
}
