//! Localized messages for known error codes.
//!
//! Backend messages are shown verbatim when no known code matches; the
//! table here only covers codes the SDK itself can anticipate.

use serde::{Deserialize, Serialize};

/// Interface locales supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Azerbaijani
    Az,
    /// English
    En,
    /// Russian
    Ru,
}

impl Locale {
    /// Locale code as used in backend payload maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Az => "az",
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::Az
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Localized message for a known error code, if the table covers it.
pub fn localized_message(locale: Locale, code: &str) -> Option<&'static str> {
    let entry = match code {
        "access_denied" => [
            "İcazə istəyi rədd edildi",
            "The authorization request was denied",
            "Запрос авторизации был отклонён",
        ],
        "invalid_request" => [
            "Sorğu düzgün qurulmayıb",
            "The request is malformed",
            "Запрос составлен неверно",
        ],
        "invalid_grant" => [
            "Avtorizasiya kodu etibarsız və ya vaxtı keçib",
            "The authorization code is invalid or expired",
            "Код авторизации недействителен или истёк",
        ],
        "invalid_scope" => [
            "İstənilən icazələr mövcud deyil",
            "The requested scopes are not available",
            "Запрошенные разрешения недоступны",
        ],
        "server_error" => [
            "Serverdə xəta baş verdi",
            "The server encountered an error",
            "На сервере произошла ошибка",
        ],
        "popup_blocked" => [
            "Brauzer pəncərənin açılmasına icazə vermədi",
            "The browser blocked the sign-in window",
            "Браузер заблокировал окно входа",
        ],
        "state_mismatch" => [
            "Təhlükəsizlik yoxlaması alınmadı, yenidən cəhd edin",
            "Security check failed, please try again",
            "Проверка безопасности не пройдена, попробуйте ещё раз",
        ],
        "cancelled" => [
            "Əməliyyat ləğv edildi",
            "The operation was cancelled",
            "Операция была отменена",
        ],
        "timeout" => [
            "Gözləmə vaxtı bitdi",
            "The operation timed out",
            "Время ожидания истекло",
        ],
        "charge_expired" => [
            "Ödəniş sorğusunun vaxtı bitib",
            "The charge request has expired",
            "Срок запроса на оплату истёк",
        ],
        "insufficient_balance" => [
            "Balansınız kifayət etmir",
            "Your balance is insufficient",
            "Недостаточно средств на балансе",
        ],
        "network_error" => [
            "Şəbəkə xətası baş verdi",
            "A network error occurred",
            "Произошла ошибка сети",
        ],
        _ => return None,
    };
    let index = match locale {
        Locale::Az => 0,
        Locale::En => 1,
        Locale::Ru => 2,
    };
    Some(entry[index])
}

/// Localized message with a generic fallback for unknown codes.
pub fn error_message(locale: Locale, code: &str) -> &'static str {
    localized_message(locale, code).unwrap_or(match locale {
        Locale::Az => "Gözlənilməz xəta baş verdi",
        Locale::En => "An unexpected error occurred",
        Locale::Ru => "Произошла непредвиденная ошибка",
    })
}
