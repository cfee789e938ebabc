use serde::Serialize;

use crate::models::{Channel, Domain, TenureBand};

/// Per-domain weights. Non-negative; they need not sum to one because the
/// calculator divides by the weight of the domains actually present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightProfile {
    pub qa: f64,
    pub qc: f64,
    pub csat: f64,
    pub quiz: f64,
}

impl WeightProfile {
    pub const fn new(qa: f64, qc: f64, csat: f64, quiz: f64) -> Self {
        Self { qa, qc, csat, quiz }
    }

    pub fn weight(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Qa => self.qa,
            Domain::Qc => self.qc,
            Domain::Csat => self.csat,
            Domain::Quiz => self.quiz,
        }
    }
}

const STANDARD_VOICE: WeightProfile = WeightProfile::new(0.45, 0.35, 0.0, 0.20);
const STANDARD_CHAT: WeightProfile = WeightProfile::new(0.35, 0.25, 0.20, 0.20);
// No knowledge test yet; evaluation and error rate carry the weight.
const NEW_HIRE_VOICE: WeightProfile = WeightProfile::new(0.50, 0.50, 0.0, 0.0);
const NEW_HIRE_CHAT: WeightProfile = WeightProfile::new(0.40, 0.35, 0.25, 0.0);

pub fn select_weights(channel: Channel, band: TenureBand) -> WeightProfile {
    match (channel, band) {
        (Channel::Voice, TenureBand::NewHire) => NEW_HIRE_VOICE,
        (Channel::Chat, TenureBand::NewHire) => NEW_HIRE_CHAT,
        (Channel::Voice, TenureBand::Early | TenureBand::Standard | TenureBand::Experienced) => {
            STANDARD_VOICE
        }
        (Channel::Chat, TenureBand::Early | TenureBand::Standard | TenureBand::Experienced) => {
            STANDARD_CHAT
        }
    }
}

/// Whether a domain can carry weight at all for this channel and band.
pub fn is_structurally_available(domain: Domain, channel: Channel, band: TenureBand) -> bool {
    select_weights(channel, band).weight(domain) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNELS: [Channel; 2] = [Channel::Voice, Channel::Chat];
    const BANDS: [TenureBand; 4] = [
        TenureBand::NewHire,
        TenureBand::Early,
        TenureBand::Standard,
        TenureBand::Experienced,
    ];

    #[test]
    fn voice_never_weights_satisfaction() {
        for band in BANDS {
            assert_eq!(select_weights(Channel::Voice, band).csat, 0.0);
        }
    }

    #[test]
    fn new_hires_skip_knowledge_and_use_own_profile() {
        for channel in CHANNELS {
            let new_hire = select_weights(channel, TenureBand::NewHire);
            let standard = select_weights(channel, TenureBand::Standard);
            assert_eq!(new_hire.quiz, 0.0);
            assert!(new_hire.qa > standard.qa);
            assert!(new_hire.qc > standard.qc);
        }
    }

    #[test]
    fn weights_are_non_negative() {
        for channel in CHANNELS {
            for band in BANDS {
                let profile = select_weights(channel, band);
                assert!(Domain::ALL.iter().all(|d| profile.weight(*d) >= 0.0));
            }
        }
    }

    #[test]
    fn structural_availability_tracks_weights() {
        assert!(!is_structurally_available(Domain::Csat, Channel::Voice, TenureBand::Standard));
        assert!(!is_structurally_available(Domain::Quiz, Channel::Chat, TenureBand::NewHire));
        assert!(is_structurally_available(Domain::Csat, Channel::Chat, TenureBand::NewHire));
    }
}
