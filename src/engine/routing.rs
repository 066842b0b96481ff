use crate::model::exception::ExceptionType;
use crate::model::role::Department;

/// Maps an approved exception's type to the department whose staff must
/// confirm it. `None` means the manager approval is directly terminal; an
/// unmapped type is a valid "no staff step" outcome, not an error, so newly
/// introduced types default to direct approval.
pub fn route(exception_type: ExceptionType) -> Option<Department> {
    match exception_type {
        ExceptionType::MissingMaterial => Some(Department::Pmc),
        ExceptionType::IncomingQualityDefect => Some(Department::Quality),
        ExceptionType::Rework => Some(Department::AfterSales),
        ExceptionType::AdHocTaskAssignment => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_each_type_to_its_confirming_department() {
        assert_eq!(route(ExceptionType::MissingMaterial), Some(Department::Pmc));
        assert_eq!(
            route(ExceptionType::IncomingQualityDefect),
            Some(Department::Quality)
        );
        assert_eq!(route(ExceptionType::Rework), Some(Department::AfterSales));
        assert_eq!(route(ExceptionType::AdHocTaskAssignment), None);
    }
}
