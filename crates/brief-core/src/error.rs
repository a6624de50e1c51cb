use thiserror::Error;

#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_stage() {
        let err = BriefError::Persistence("replace data.json: denied".to_string());
        assert_eq!(err.to_string(), "Persistence error: replace data.json: denied");
        assert_eq!(BriefError::Parse("no JSON".to_string()).to_string(), "Parse error: no JSON");
    }
}
