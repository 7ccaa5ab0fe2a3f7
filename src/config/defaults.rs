//! Built-in service catalogue for the chat platform.
//!
//! Used when the config file does not list any services. Base URLs come
//! from the environment variable named in `url_env`.

use crate::config::schema::ServiceConfig;

/// (name, prefix, path_rewrite, url_env, description)
const CATALOGUE: &[(&str, &str, &str, &str, &str)] = &[
    (
        "users",
        "/api/users",
        "/v1",
        "USERS_URL",
        "Servicio de autenticación y gestión de usuarios",
    ),
    (
        "channels",
        "/api/channels",
        "",
        "CHANNELS_URL",
        "Servicio de creación y gestión de canales",
    ),
    (
        "threads",
        "/api/threads",
        "",
        "THREADS_URL",
        "Servicio de gestión de hilos de conversación",
    ),
    (
        "messages",
        "/api/messages",
        "",
        "MESSAGES_URL",
        "Servicio de publicación y gestión de mensajes",
    ),
    (
        "presence",
        "/api/presence",
        "",
        "PRESENCE_URL",
        "Servicio de estado de conexión de usuarios",
    ),
    (
        "moderation",
        "/api/moderation",
        "/api/v1",
        "MODERATION_URL",
        "Servicio de moderación de contenido",
    ),
    (
        "files",
        "/api/files",
        "",
        "FILES_URL",
        "Servicio de carga y gestión de archivos",
    ),
    (
        "search",
        "/api/search",
        "",
        "SEARCH_URL",
        "Servicio de búsqueda e indexación",
    ),
    (
        "chatbotWikipedia",
        "/api/chatbot/wikipedia",
        "",
        "CHATBOT_WIKIPEDIA_URL",
        "Chatbot de consultas a Wikipedia",
    ),
    (
        "chatbotProgramming",
        "/api/chatbot/programming",
        "",
        "CHATBOT_PROGRAMMING_URL",
        "Chatbot de ayuda en programación",
    ),
];

/// The default chat-platform services, in registration order.
pub fn default_services() -> Vec<ServiceConfig> {
    CATALOGUE
        .iter()
        .map(|(name, prefix, rewrite, env, description)| ServiceConfig {
            name: (*name).to_string(),
            prefix: (*prefix).to_string(),
            url: None,
            url_env: Some((*env).to_string()),
            path_rewrite: (*rewrite).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}
