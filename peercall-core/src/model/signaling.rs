use crate::codec::{DecodeError, EncodeError};
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MessageType {
    Offer,
    Answer,
    Ice,
    SetPeer,
}

impl MessageType {
    /// Numeric tag used on the wire. Zero is reserved for "unknown".
    pub fn tag(self) -> u8 {
        match self {
            MessageType::Offer => 1,
            MessageType::Answer => 2,
            MessageType::Ice => 3,
            MessageType::SetPeer => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(MessageType::Offer),
            2 => Some(MessageType::Answer),
            3 => Some(MessageType::Ice),
            4 => Some(MessageType::SetPeer),
            _ => None,
        }
    }
}

/// One connectivity candidate as produced by the media engine.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_m_line_index: u32,
    pub sdp_mid: String,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>, sdp_m_line_index: u32, sdp_mid: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_m_line_index,
            sdp_mid: sdp_mid.into(),
        }
    }

    /// Joins the triple with `separator`. Fails if a field is empty or already
    /// contains the separator, since the result could not be split back.
    pub fn join(&self, separator: &str) -> Result<String, EncodeError> {
        if separator.is_empty() {
            return Err(EncodeError::EmptySeparator);
        }
        if separator.chars().count() != 1 {
            return Err(EncodeError::InvalidSeparator(separator.to_owned()));
        }
        for field in [self.candidate.as_str(), self.sdp_mid.as_str()] {
            if field.is_empty() {
                return Err(EncodeError::EmptyIceField);
            }
            if field.contains(separator) {
                return Err(EncodeError::SeparatorInField {
                    separator: separator.to_owned(),
                });
            }
        }

        Ok(format!(
            "{}{sep}{}{sep}{}",
            self.candidate,
            self.sdp_m_line_index,
            self.sdp_mid,
            sep = separator
        ))
    }

    /// Splits an Ice payload on a single-character separator. Exactly three
    /// non-empty fields are required.
    pub fn split(data: &str, separator: &str) -> Result<Self, DecodeError> {
        if separator.is_empty() {
            return Err(DecodeError::MissingSeparator);
        }
        if separator.chars().count() != 1 {
            return Err(DecodeError::InvalidSeparator(separator.to_owned()));
        }

        let parts: Vec<&str> = data.split(separator).collect();
        if parts.len() != 3 {
            return Err(DecodeError::IceArity { found: parts.len() });
        }
        if let Some(index) = parts.iter().position(|p| p.is_empty()) {
            return Err(DecodeError::EmptyIceField { index });
        }

        let sdp_m_line_index = parts[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| DecodeError::InvalidLineIndex(parts[1].to_owned()))?;

        Ok(Self {
            candidate: parts[0].to_owned(),
            sdp_m_line_index,
            sdp_mid: parts[2].to_owned(),
        })
    }
}

/// Negotiation payload carried inside a relay message.
///
/// `target_id` is the addressee, which the relay routes by. It is not
/// necessarily the sender.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignalingMessage {
    pub message_type: MessageType,
    pub data: String,
    pub target_id: PeerId,
    /// Present only for [`MessageType::Ice`].
    pub ice_separator: Option<String>,
}

impl SignalingMessage {
    pub fn offer(target_id: PeerId, sdp: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Offer,
            data: sdp.into(),
            target_id,
            ice_separator: None,
        }
    }

    pub fn answer(target_id: PeerId, sdp: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Answer,
            data: sdp.into(),
            target_id,
            ice_separator: None,
        }
    }

    pub fn set_peer(target_id: PeerId) -> Self {
        Self {
            message_type: MessageType::SetPeer,
            data: String::new(),
            target_id,
            ice_separator: None,
        }
    }

    pub fn ice(target_id: PeerId, candidate: &IceCandidate, separator: char) -> Result<Self, EncodeError> {
        let separator = separator.to_string();
        let data = candidate.join(&separator)?;
        Ok(Self {
            message_type: MessageType::Ice,
            data,
            target_id,
            ice_separator: Some(separator),
        })
    }

    /// Structured view of an Ice payload.
    pub fn ice_candidate(&self) -> Result<IceCandidate, DecodeError> {
        if self.message_type != MessageType::Ice {
            return Err(DecodeError::NotIce(self.message_type));
        }
        let separator = self
            .ice_separator
            .as_deref()
            .ok_or(DecodeError::MissingSeparator)?;
        IceCandidate::split(&self.data, separator)
    }
}
