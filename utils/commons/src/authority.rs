use crate::{ContractResult, CustomContractError};
use concordium_std::*;

#[derive(Debug, Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct Authority<S: HasStateApi> {
    /// Trusted addresses that are allowed to administer the contract and update admin and maintainer lists
    admins: StateSet<Address, S>,
    /// Semi-trusted addresses that are allowed to update the maintainer list
    maintainers: StateSet<Address, S>,
}

/// Capability proving that the holder has admin rights.
///
/// Can only be obtained through [`Authority::admin_cap`], so every operation
/// taking `&AdminCap` is unreachable for callers without admin rights.
#[derive(Debug)]
pub struct AdminCap {
    holder: Address,
}

impl AdminCap {
    pub fn holder(&self) -> &Address {
        &self.holder
    }
}

impl<S: HasStateApi> Authority<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, admin: Address) -> Self {
        let mut admins = state_builder.new_set();
        admins.insert(admin);
        Self {
            admins,
            maintainers: state_builder.new_set(),
        }
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    pub fn has_maintainer_rights(&self, address: &Address) -> bool {
        self.maintainers.contains(address) || self.has_admin_rights(address)
    }

    /// Issue the admin capability to `sender`, or reject with `Unauthorized`.
    pub fn admin_cap(&self, sender: &Address) -> ContractResult<AdminCap> {
        ensure!(
            self.has_admin_rights(sender),
            CustomContractError::Unauthorized
        );
        Ok(AdminCap { holder: *sender })
    }

    pub fn handle_update(
        &mut self,
        sender: Address,
        update: AuthorityUpdateParams,
    ) -> ContractResult<()> {
        let address_list = match update.field {
            AuthorityField::Maintainer => {
                ensure!(
                    self.has_maintainer_rights(&sender),
                    CustomContractError::Unauthorized
                );
                &mut self.maintainers
            }
            AuthorityField::Admin => {
                ensure!(
                    self.has_admin_rights(&sender),
                    CustomContractError::Unauthorized
                );
                &mut self.admins
            }
        };

        match update.kind {
            AuthorityUpdateKind::Remove => {
                address_list.remove(&update.address);
            }
            AuthorityUpdateKind::Add => {
                address_list.insert(update.address);
            }
        }

        Ok(())
    }

    pub fn handle_view(&self, view: AuthorityViewParams) -> Vec<Address> {
        let address_list = match view.field {
            AuthorityField::Maintainer => &self.maintainers,
            AuthorityField::Admin => &self.admins,
        };

        address_list
            .iter()
            .skip(view.skip as usize)
            .take(view.show as usize)
            .map(|a| *a)
            .collect()
    }
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityField {
    Maintainer,
    Admin,
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityUpdateKind {
    Remove,
    Add,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityUpdateParams {
    pub field: AuthorityField,
    pub kind: AuthorityUpdateKind,
    pub address: Address,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityViewParams {
    pub field: AuthorityField,
    pub skip: u32,
    pub show: u32,
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const ADMIN_ACCOUNT: AccountAddress = AccountAddress([1; 32]);
    const ADMIN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 1,
    };

    const MAINTAINER_ACCOUNT: AccountAddress = AccountAddress([2; 32]);

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn default_authority() -> Authority<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();

        let mut authority = Authority::new(&mut state_builder, Address::Account(ADMIN_ACCOUNT));
        authority.admins.insert(Address::Contract(ADMIN_CONTRACT));
        authority
            .maintainers
            .insert(Address::Account(MAINTAINER_ACCOUNT));

        authority
    }

    #[concordium_test]
    fn test_admin_cap_only_for_admins() {
        let authority = default_authority();

        let cap = authority
            .admin_cap(&Address::Account(ADMIN_ACCOUNT))
            .expect_report("Admin should receive the capability");
        claim_eq!(cap.holder(), &Address::Account(ADMIN_ACCOUNT));
        claim!(authority
            .admin_cap(&Address::Contract(ADMIN_CONTRACT))
            .is_ok());

        // Maintainers do not hold admin rights
        claim_eq!(
            authority
                .admin_cap(&Address::Account(MAINTAINER_ACCOUNT))
                .map(|_| ()),
            Err(CustomContractError::Unauthorized)
        );
        claim_eq!(
            authority.admin_cap(&Address::Account(USER_1)).map(|_| ()),
            Err(CustomContractError::Unauthorized)
        );
    }

    #[concordium_test]
    fn test_update_authority_add_new_admin() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Admin,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER_1),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(authority.has_admin_rights(&Address::Account(USER_1)));
        claim!(authority.has_maintainer_rights(&Address::Account(USER_1)));

        let result = authority.handle_update(
            Address::Account(MAINTAINER_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Admin,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER_2),
            },
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(!authority.has_admin_rights(&Address::Account(USER_2)));
    }

    #[concordium_test]
    fn test_update_authority_maintainer_list() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(MAINTAINER_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Maintainer,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER_1),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_admin_rights(&Address::Account(USER_1)));
        claim!(authority.has_maintainer_rights(&Address::Account(USER_1)));

        let result = authority.handle_update(
            Address::Account(USER_2),
            AuthorityUpdateParams {
                field: AuthorityField::Maintainer,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER_2),
            },
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(!authority.has_maintainer_rights(&Address::Account(USER_2)));

        let result = authority.handle_update(
            Address::Account(ADMIN_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Maintainer,
                kind: AuthorityUpdateKind::Remove,
                address: Address::Account(MAINTAINER_ACCOUNT),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_maintainer_rights(&Address::Account(MAINTAINER_ACCOUNT)));
    }

    #[concordium_test]
    fn test_update_authority_remove_admin() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Admin,
                kind: AuthorityUpdateKind::Remove,
                address: Address::Contract(ADMIN_CONTRACT),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_admin_rights(&Address::Contract(ADMIN_CONTRACT)));
        claim!(authority
            .admin_cap(&Address::Contract(ADMIN_CONTRACT))
            .is_err());

        // Removing a missing address is not an error
        let result = authority.handle_update(
            Address::Account(ADMIN_ACCOUNT),
            AuthorityUpdateParams {
                field: AuthorityField::Admin,
                kind: AuthorityUpdateKind::Remove,
                address: Address::Account(USER_1),
            },
        );
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_view_authority_admins() {
        let mut authority = default_authority();

        let mut expected: Vec<Address> = (16u8..=80u8)
            .map(|n| Address::Account(AccountAddress([n; 32])))
            .chain([
                Address::Account(ADMIN_ACCOUNT),
                Address::Contract(ADMIN_CONTRACT),
            ])
            .collect();

        for admin in expected.iter() {
            authority.admins.insert(*admin);
        }

        let mut num_seen = 0;
        let increment = 30;
        loop {
            let returned_addresses = authority.handle_view(AuthorityViewParams {
                field: AuthorityField::Admin,
                skip: num_seen,
                show: increment,
            });

            for addr in returned_addresses.iter() {
                let position = expected.iter().position(|a| a == addr);
                claim!(position.is_some());
                expected.swap_remove(position.unwrap());
            }

            if returned_addresses.len() != increment as usize {
                break;
            }
            num_seen += increment;
        }

        claim!(expected.is_empty());
    }
}
