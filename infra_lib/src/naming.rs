use crate::{Error, Result};

const STACK_NAME_RESTRICTION: &str = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";

pub fn verify_resource_name(resource_name: &str) -> Result<()> {
    let err = |reason: &str| Err(Error::InvalidResourceName {
        name: resource_name.to_string(),
        reason: reason.to_string(),
    });
    if resource_name.len() > 255 {
        return err("must be less than 255 characters");
    }
    if resource_name.is_empty() {
        return err("Must contain at least 1 character");
    }
    if !resource_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return err("Must contain only alphanumeric characters [A-Za-z0-9]");
    }
    Ok(())
}

pub fn validate_stack_name(stack_name: &str) -> Result<()> {
    let err = || Err(Error::InvalidStackName {
        name: stack_name.to_string(),
        reason: STACK_NAME_RESTRICTION.to_string(),
    });
    match stack_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return err(),
    }
    if !stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return err();
    }
    if stack_name.len() > 128 {
        return err();
    }
    Ok(())
}

pub fn validate_bucket_name(bucket_name: &str) -> Result<()> {
    let err = |reason: &str| Err(Error::InvalidBucketName {
        name: bucket_name.to_string(),
        reason: reason.to_string(),
    });
    if bucket_name.len() > 63 || bucket_name.len() < 3 {
        return err("Must be between 3 and 63 characters");
    }
    let valid_char_check = |c: char| -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    };
    if !bucket_name.chars().all(valid_char_check) {
        return err("May only contain lowercase letters, numbers, dots, and dashes");
    }
    let first_ok = bucket_name.chars().next().map_or(false, |c| c.is_ascii_alphanumeric());
    let last_ok = bucket_name.chars().last().map_or(false, |c| c.is_ascii_alphanumeric());
    if !first_ok || !last_ok {
        return err("First and last character must be either lowercase letter, or number");
    }
    if bucket_name.contains("..") {
        return err("May not contain two consecutive dots");
    }
    Ok(())
}

pub fn validate_account(account: &str) -> Result<()> {
    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidAccount(account.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_must_be_alphanumeric() {
        assert!(verify_resource_name("SiteDistribution").is_ok());
        assert!(verify_resource_name("").is_err());
        assert!(verify_resource_name("Site_Distribution").is_err());
        assert!(verify_resource_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn stack_names() {
        assert!(validate_stack_name("MoltaWebsiteInfraStack").is_ok());
        assert!(validate_stack_name("my-stack-2").is_ok());
        assert!(validate_stack_name("2stack").is_err());
        assert!(validate_stack_name("my_stack").is_err());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name(&format!("a{}", "b".repeat(128))).is_err());
    }

    #[test]
    fn bucket_names() {
        assert!(validate_bucket_name("moltabakery.com").is_ok());
        let e = validate_bucket_name("something..exact").unwrap_err();
        assert!(e.to_string().contains("May not contain two consecutive dots"));
        let e = validate_bucket_name("ab").unwrap_err();
        assert!(e.to_string().contains("Must be between 3 and 63 characters"));
        assert!(validate_bucket_name("Upper.com").is_err());
        assert!(validate_bucket_name("-dash.com").is_err());
    }

    #[test]
    fn accounts_are_twelve_digits() {
        assert!(validate_account("120086452202").is_ok());
        assert!(validate_account("12008645220").is_err());
        assert!(validate_account("12008645220x").is_err());
    }
}
