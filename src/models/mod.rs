// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : Requêtes / réponses JSON de l'API membres
//   - members : Comptes membres (mot de passe et/ou OAuth)
//   - one_time_tokens : Tokens email (vérification 24h, reset password 1h)
//   - member_sessions : Une session par connexion (7 jours)
//   - oauth_accounts : Liens Google / Facebook
//   - member_favorites : Articles favoris
//   - reading_history : Progression de lecture
//   - articles : Projection en lecture seule des articles
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les dates sont en UTC (DateTimeUtc)
//   - Les tables sont créées par db::create_schema en test et en dev
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod members;
pub mod one_time_tokens;
pub mod member_sessions;
pub mod oauth_accounts;
pub mod member_favorites;
pub mod reading_history;
pub mod articles;
