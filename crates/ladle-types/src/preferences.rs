//! The nine per-user preference categories.
//!
//! Each category is a fixed serde schema with documented defaults and a patch
//! type whose fields are all optional (absent = leave unchanged). Categories
//! are fully independent: a patch for one category can never touch another.
//! [`PreferenceUpdate`] is the tagged sum over the nine patch schemas, which
//! replaces any need for runtime type assertions on dynamic payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of preference categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceCategory {
    Notification,
    Display,
    Privacy,
    Accessibility,
    Language,
    Security,
    Social,
    Sound,
    Theme,
}

impl PreferenceCategory {
    pub const ALL: [PreferenceCategory; 9] = [
        PreferenceCategory::Notification,
        PreferenceCategory::Display,
        PreferenceCategory::Privacy,
        PreferenceCategory::Accessibility,
        PreferenceCategory::Language,
        PreferenceCategory::Security,
        PreferenceCategory::Social,
        PreferenceCategory::Sound,
        PreferenceCategory::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceCategory::Notification => "notification",
            PreferenceCategory::Display => "display",
            PreferenceCategory::Privacy => "privacy",
            PreferenceCategory::Accessibility => "accessibility",
            PreferenceCategory::Language => "language",
            PreferenceCategory::Security => "security",
            PreferenceCategory::Social => "social",
            PreferenceCategory::Sound => "sound",
            PreferenceCategory::Theme => "theme",
        }
    }
}

impl fmt::Display for PreferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown preference category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for PreferenceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreferenceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// -- Category schemas --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigestFrequency {
    Daily,
    Weekly,
    Monthly,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPrefs {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub notify_on_new_follower: bool,
    pub notify_on_recipe_comment: bool,
    pub notify_on_recipe_like: bool,
    pub weekly_digest: bool,
    pub digest_frequency: DigestFrequency,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            notify_on_new_follower: true,
            notify_on_recipe_comment: true,
            notify_on_recipe_like: false,
            weekly_digest: true,
            digest_frequency: DigestFrequency::Weekly,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationPrefsPatch {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub notify_on_new_follower: Option<bool>,
    pub notify_on_recipe_comment: Option<bool>,
    pub notify_on_recipe_like: Option<bool>,
    pub weekly_digest: Option<bool>,
    pub digest_frequency: Option<DigestFrequency>,
}

impl NotificationPrefsPatch {
    pub fn apply(&self, prefs: &mut NotificationPrefs) {
        if let Some(v) = self.email_notifications {
            prefs.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            prefs.push_notifications = v;
        }
        if let Some(v) = self.notify_on_new_follower {
            prefs.notify_on_new_follower = v;
        }
        if let Some(v) = self.notify_on_recipe_comment {
            prefs.notify_on_recipe_comment = v;
        }
        if let Some(v) = self.notify_on_recipe_like {
            prefs.notify_on_recipe_like = v;
        }
        if let Some(v) = self.weekly_digest {
            prefs.weekly_digest = v;
        }
        if let Some(v) = self.digest_frequency {
            prefs.digest_frequency = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeMode {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    pub theme: ThemeMode,
    pub font_size: FontSize,
    pub recipes_per_page: u32,
    pub show_metric_units: bool,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            font_size: FontSize::Medium,
            recipes_per_page: 20,
            show_metric_units: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayPrefsPatch {
    pub theme: Option<ThemeMode>,
    pub font_size: Option<FontSize>,
    pub recipes_per_page: Option<u32>,
    pub show_metric_units: Option<bool>,
}

impl DisplayPrefsPatch {
    pub fn apply(&self, prefs: &mut DisplayPrefs) {
        if let Some(v) = self.theme {
            prefs.theme = v;
        }
        if let Some(v) = self.font_size {
            prefs.font_size = v;
        }
        if let Some(v) = self.recipes_per_page {
            prefs.recipes_per_page = v;
        }
        if let Some(v) = self.show_metric_units {
            prefs.show_metric_units = v;
        }
    }
}

/// Data-handling settings. Distinct from the authorization-relevant
/// `privacy_preferences` row that drives profile visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub show_activity: bool,
    pub show_favorites: bool,
    pub searchable: bool,
    pub personalized_ads: bool,
    pub data_sharing: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_activity: true,
            show_favorites: true,
            searchable: true,
            personalized_ads: false,
            data_sharing: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrivacySettingsPatch {
    pub show_activity: Option<bool>,
    pub show_favorites: Option<bool>,
    pub searchable: Option<bool>,
    pub personalized_ads: Option<bool>,
    pub data_sharing: Option<bool>,
}

impl PrivacySettingsPatch {
    pub fn apply(&self, prefs: &mut PrivacySettings) {
        if let Some(v) = self.show_activity {
            prefs.show_activity = v;
        }
        if let Some(v) = self.show_favorites {
            prefs.show_favorites = v;
        }
        if let Some(v) = self.searchable {
            prefs.searchable = v;
        }
        if let Some(v) = self.personalized_ads {
            prefs.personalized_ads = v;
        }
        if let Some(v) = self.data_sharing {
            prefs.data_sharing = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityPrefs {
    pub high_contrast: bool,
    pub large_text: bool,
    pub screen_reader_optimized: bool,
    pub reduce_motion: bool,
    pub keyboard_shortcuts: bool,
}

impl Default for AccessibilityPrefs {
    fn default() -> Self {
        Self {
            high_contrast: false,
            large_text: false,
            screen_reader_optimized: false,
            reduce_motion: false,
            keyboard_shortcuts: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessibilityPrefsPatch {
    pub high_contrast: Option<bool>,
    pub large_text: Option<bool>,
    pub screen_reader_optimized: Option<bool>,
    pub reduce_motion: Option<bool>,
    pub keyboard_shortcuts: Option<bool>,
}

impl AccessibilityPrefsPatch {
    pub fn apply(&self, prefs: &mut AccessibilityPrefs) {
        if let Some(v) = self.high_contrast {
            prefs.high_contrast = v;
        }
        if let Some(v) = self.large_text {
            prefs.large_text = v;
        }
        if let Some(v) = self.screen_reader_optimized {
            prefs.screen_reader_optimized = v;
        }
        if let Some(v) = self.reduce_motion {
            prefs.reduce_motion = v;
        }
        if let Some(v) = self.keyboard_shortcuts {
            prefs.keyboard_shortcuts = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateFormat {
    Mdy,
    Dmy,
    Ymd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePrefs {
    pub language: String,
    pub region: String,
    pub date_format: DateFormat,
    pub measurement_system: MeasurementSystem,
    pub timezone: String,
}

impl Default for LanguagePrefs {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            region: "US".to_string(),
            date_format: DateFormat::Mdy,
            measurement_system: MeasurementSystem::Metric,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguagePrefsPatch {
    pub language: Option<String>,
    pub region: Option<String>,
    pub date_format: Option<DateFormat>,
    pub measurement_system: Option<MeasurementSystem>,
    pub timezone: Option<String>,
}

impl LanguagePrefsPatch {
    pub fn apply(&self, prefs: &mut LanguagePrefs) {
        if let Some(v) = &self.language {
            prefs.language = v.clone();
        }
        if let Some(v) = &self.region {
            prefs.region = v.clone();
        }
        if let Some(v) = self.date_format {
            prefs.date_format = v;
        }
        if let Some(v) = self.measurement_system {
            prefs.measurement_system = v;
        }
        if let Some(v) = &self.timezone {
            prefs.timezone = v.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPrefs {
    pub two_factor_enabled: bool,
    pub login_alerts: bool,
    pub remember_devices: bool,
    pub session_timeout_minutes: u32,
}

impl Default for SecurityPrefs {
    fn default() -> Self {
        Self {
            two_factor_enabled: false,
            login_alerts: true,
            remember_devices: true,
            session_timeout_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityPrefsPatch {
    pub two_factor_enabled: Option<bool>,
    pub login_alerts: Option<bool>,
    pub remember_devices: Option<bool>,
    pub session_timeout_minutes: Option<u32>,
}

impl SecurityPrefsPatch {
    pub fn apply(&self, prefs: &mut SecurityPrefs) {
        if let Some(v) = self.two_factor_enabled {
            prefs.two_factor_enabled = v;
        }
        if let Some(v) = self.login_alerts {
            prefs.login_alerts = v;
        }
        if let Some(v) = self.remember_devices {
            prefs.remember_devices = v;
        }
        if let Some(v) = self.session_timeout_minutes {
            prefs.session_timeout_minutes = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPrefs {
    pub show_following: bool,
    pub show_followers: bool,
    pub allow_mentions: bool,
    pub allow_recipe_shares: bool,
    pub activity_feed_visible: bool,
}

impl Default for SocialPrefs {
    fn default() -> Self {
        Self {
            show_following: true,
            show_followers: true,
            allow_mentions: true,
            allow_recipe_shares: true,
            activity_feed_visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialPrefsPatch {
    pub show_following: Option<bool>,
    pub show_followers: Option<bool>,
    pub allow_mentions: Option<bool>,
    pub allow_recipe_shares: Option<bool>,
    pub activity_feed_visible: Option<bool>,
}

impl SocialPrefsPatch {
    pub fn apply(&self, prefs: &mut SocialPrefs) {
        if let Some(v) = self.show_following {
            prefs.show_following = v;
        }
        if let Some(v) = self.show_followers {
            prefs.show_followers = v;
        }
        if let Some(v) = self.allow_mentions {
            prefs.allow_mentions = v;
        }
        if let Some(v) = self.allow_recipe_shares {
            prefs.allow_recipe_shares = v;
        }
        if let Some(v) = self.activity_feed_visible {
            prefs.activity_feed_visible = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundPrefs {
    pub sound_enabled: bool,
    pub notification_sounds: bool,
    pub timer_alerts: bool,
    pub volume: u32,
}

impl Default for SoundPrefs {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notification_sounds: true,
            timer_alerts: true,
            volume: 70,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoundPrefsPatch {
    pub sound_enabled: Option<bool>,
    pub notification_sounds: Option<bool>,
    pub timer_alerts: Option<bool>,
    pub volume: Option<u32>,
}

impl SoundPrefsPatch {
    pub fn apply(&self, prefs: &mut SoundPrefs) {
        if let Some(v) = self.sound_enabled {
            prefs.sound_enabled = v;
        }
        if let Some(v) = self.notification_sounds {
            prefs.notification_sounds = v;
        }
        if let Some(v) = self.timer_alerts {
            prefs.timer_alerts = v;
        }
        if let Some(v) = self.volume {
            prefs.volume = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DarkModeSchedule {
    Off,
    System,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemePrefs {
    pub color_scheme: String,
    pub accent_color: String,
    pub dark_mode_schedule: DarkModeSchedule,
}

impl Default for ThemePrefs {
    fn default() -> Self {
        Self {
            color_scheme: "classic".to_string(),
            accent_color: "#e8590c".to_string(),
            dark_mode_schedule: DarkModeSchedule::System,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemePrefsPatch {
    pub color_scheme: Option<String>,
    pub accent_color: Option<String>,
    pub dark_mode_schedule: Option<DarkModeSchedule>,
}

impl ThemePrefsPatch {
    pub fn apply(&self, prefs: &mut ThemePrefs) {
        if let Some(v) = &self.color_scheme {
            prefs.color_scheme = v.clone();
        }
        if let Some(v) = &self.accent_color {
            prefs.accent_color = v.clone();
        }
        if let Some(v) = self.dark_mode_schedule {
            prefs.dark_mode_schedule = v;
        }
    }
}

// -- Dispatch --

/// A validated update for exactly one category.
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceUpdate {
    Notification(NotificationPrefsPatch),
    Display(DisplayPrefsPatch),
    Privacy(PrivacySettingsPatch),
    Accessibility(AccessibilityPrefsPatch),
    Language(LanguagePrefsPatch),
    Security(SecurityPrefsPatch),
    Social(SocialPrefsPatch),
    Sound(SoundPrefsPatch),
    Theme(ThemePrefsPatch),
}

impl PreferenceUpdate {
    pub fn category(&self) -> PreferenceCategory {
        match self {
            PreferenceUpdate::Notification(_) => PreferenceCategory::Notification,
            PreferenceUpdate::Display(_) => PreferenceCategory::Display,
            PreferenceUpdate::Privacy(_) => PreferenceCategory::Privacy,
            PreferenceUpdate::Accessibility(_) => PreferenceCategory::Accessibility,
            PreferenceUpdate::Language(_) => PreferenceCategory::Language,
            PreferenceUpdate::Security(_) => PreferenceCategory::Security,
            PreferenceUpdate::Social(_) => PreferenceCategory::Social,
            PreferenceUpdate::Sound(_) => PreferenceCategory::Sound,
            PreferenceUpdate::Theme(_) => PreferenceCategory::Theme,
        }
    }

    /// Decode a raw JSON body against the patch schema of `category`.
    /// Unknown fields are rejected.
    pub fn from_value(
        category: PreferenceCategory,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match category {
            PreferenceCategory::Notification => {
                PreferenceUpdate::Notification(serde_json::from_value(value)?)
            }
            PreferenceCategory::Display => {
                PreferenceUpdate::Display(serde_json::from_value(value)?)
            }
            PreferenceCategory::Privacy => {
                PreferenceUpdate::Privacy(serde_json::from_value(value)?)
            }
            PreferenceCategory::Accessibility => {
                PreferenceUpdate::Accessibility(serde_json::from_value(value)?)
            }
            PreferenceCategory::Language => {
                PreferenceUpdate::Language(serde_json::from_value(value)?)
            }
            PreferenceCategory::Security => {
                PreferenceUpdate::Security(serde_json::from_value(value)?)
            }
            PreferenceCategory::Social => {
                PreferenceUpdate::Social(serde_json::from_value(value)?)
            }
            PreferenceCategory::Sound => PreferenceUpdate::Sound(serde_json::from_value(value)?),
            PreferenceCategory::Theme => PreferenceUpdate::Theme(serde_json::from_value(value)?),
        })
    }
}

/// Body of `PATCH /users/{id}/preferences`: one optional patch per category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesPatch {
    pub notification: Option<NotificationPrefsPatch>,
    pub display: Option<DisplayPrefsPatch>,
    pub privacy: Option<PrivacySettingsPatch>,
    pub accessibility: Option<AccessibilityPrefsPatch>,
    pub language: Option<LanguagePrefsPatch>,
    pub security: Option<SecurityPrefsPatch>,
    pub social: Option<SocialPrefsPatch>,
    pub sound: Option<SoundPrefsPatch>,
    pub theme: Option<ThemePrefsPatch>,
}

impl PreferencesPatch {
    /// The present categories, in declaration order.
    pub fn into_updates(self) -> Vec<PreferenceUpdate> {
        let mut updates = Vec::new();
        if let Some(p) = self.notification {
            updates.push(PreferenceUpdate::Notification(p));
        }
        if let Some(p) = self.display {
            updates.push(PreferenceUpdate::Display(p));
        }
        if let Some(p) = self.privacy {
            updates.push(PreferenceUpdate::Privacy(p));
        }
        if let Some(p) = self.accessibility {
            updates.push(PreferenceUpdate::Accessibility(p));
        }
        if let Some(p) = self.language {
            updates.push(PreferenceUpdate::Language(p));
        }
        if let Some(p) = self.security {
            updates.push(PreferenceUpdate::Security(p));
        }
        if let Some(p) = self.social {
            updates.push(PreferenceUpdate::Social(p));
        }
        if let Some(p) = self.sound {
            updates.push(PreferenceUpdate::Sound(p));
        }
        if let Some(p) = self.theme {
            updates.push(PreferenceUpdate::Theme(p));
        }
        updates
    }
}

/// The documented defaults for a category, as a JSON document.
pub fn default_document(category: PreferenceCategory) -> serde_json::Value {
    // Serializing a plain struct of primitives cannot fail.
    match category {
        PreferenceCategory::Notification => {
            serde_json::to_value(NotificationPrefs::default()).unwrap()
        }
        PreferenceCategory::Display => serde_json::to_value(DisplayPrefs::default()).unwrap(),
        PreferenceCategory::Privacy => serde_json::to_value(PrivacySettings::default()).unwrap(),
        PreferenceCategory::Accessibility => {
            serde_json::to_value(AccessibilityPrefs::default()).unwrap()
        }
        PreferenceCategory::Language => serde_json::to_value(LanguagePrefs::default()).unwrap(),
        PreferenceCategory::Security => serde_json::to_value(SecurityPrefs::default()).unwrap(),
        PreferenceCategory::Social => serde_json::to_value(SocialPrefs::default()).unwrap(),
        PreferenceCategory::Sound => serde_json::to_value(SoundPrefs::default()).unwrap(),
        PreferenceCategory::Theme => serde_json::to_value(ThemePrefs::default()).unwrap(),
    }
}

/// Merge `update` over `current` (a stored category document) and return the
/// new document. Fields missing from `current` are filled from the category
/// defaults before the patch is applied.
pub fn apply_update(
    current: serde_json::Value,
    update: &PreferenceUpdate,
) -> Result<serde_json::Value, serde_json::Error> {
    match update {
        PreferenceUpdate::Notification(patch) => {
            let mut prefs: NotificationPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Display(patch) => {
            let mut prefs: DisplayPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Privacy(patch) => {
            let mut prefs: PrivacySettings = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Accessibility(patch) => {
            let mut prefs: AccessibilityPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Language(patch) => {
            let mut prefs: LanguagePrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Security(patch) => {
            let mut prefs: SecurityPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Social(patch) => {
            let mut prefs: SocialPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Sound(patch) => {
            let mut prefs: SoundPrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
        PreferenceUpdate::Theme(patch) => {
            let mut prefs: ThemePrefs = serde_json::from_value(current)?;
            patch.apply(&mut prefs);
            serde_json::to_value(prefs)
        }
    }
}
