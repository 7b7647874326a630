use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("encryption enabled but passphrase empty")]
    MissingPassphrase,

    #[error("envelope too short or not valid transport text")]
    MalformedEnvelope,

    #[error("envelope authentication failed")]
    AuthenticationFailure,

    #[error("encryption error")]
    Encryption,

    #[error("message too long{} ({on_air} > {limit})", capacity_suffix(.encrypted))]
    CapacityExceeded {
        on_air: usize,
        limit: usize,
        encrypted: bool,
    },

    #[error("channel busy")]
    ChannelBusy,

    #[error("codec produced no samples for this payload")]
    EncodeRejected,
}

fn capacity_suffix(encrypted: &bool) -> &'static str {
    if *encrypted { " after encryption" } else { "" }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_encryption_overage() {
        let err = ChatError::CapacityExceeded {
            on_air: 264,
            limit: 170,
            encrypted: true,
        };
        assert_eq!(
            err.to_string(),
            "message too long after encryption (264 > 170)"
        );

        let err = ChatError::CapacityExceeded {
            on_air: 171,
            limit: 170,
            encrypted: false,
        };
        assert_eq!(err.to_string(), "message too long (171 > 170)");
    }
}
